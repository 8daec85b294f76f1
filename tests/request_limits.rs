use storefront_api::{
    error::AppError,
    routes::params::{DEFAULT_PER_PAGE, MAX_PER_PAGE, normalize_page},
    services::order_service::{MAX_LINE_QUANTITY, merge_lines},
};
use uuid::Uuid;

#[test]
fn paging_defaults_and_clamps() {
    assert_eq!(normalize_page(None, None), (1, DEFAULT_PER_PAGE, 0));
    assert_eq!(normalize_page(Some(0), Some(0)), (1, 1, 0));
    assert_eq!(normalize_page(Some(3), Some(500)), (3, MAX_PER_PAGE, 200));
}

#[test]
fn huge_page_numbers_saturate_the_offset() {
    let (page, per_page, offset) = normalize_page(Some(i64::MAX), Some(100));
    assert_eq!(page, i64::MAX);
    assert_eq!(per_page, 100);
    assert_eq!(offset, i64::MAX);

    let (_, _, offset) = normalize_page(Some(i64::MIN), Some(100));
    assert_eq!(offset, 0);
}

#[test]
fn duplicate_lines_are_merged() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let merged = merge_lines([(a, 2), (b, 1), (a, 3)]).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[&a], 5);
    assert_eq!(merged[&b], 1);
}

#[test]
fn non_positive_quantities_are_rejected() {
    let product = Uuid::new_v4();
    assert!(matches!(
        merge_lines([(product, 0)]),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        merge_lines([(product, 1), (product, -1)]),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn overflowing_duplicate_lines_are_rejected() {
    let product = Uuid::new_v4();

    let err = merge_lines([(product, i32::MAX), (product, i32::MAX), (product, 3)]).unwrap_err();
    match err {
        AppError::BadRequest(message) => assert!(message.contains("too large")),
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[test]
fn merged_quantity_is_capped() {
    let product = Uuid::new_v4();

    assert_eq!(
        merge_lines([(product, MAX_LINE_QUANTITY)]).unwrap()[&product],
        MAX_LINE_QUANTITY
    );
    assert!(merge_lines([(product, MAX_LINE_QUANTITY), (product, 1)]).is_err());
    assert!(merge_lines([(product, MAX_LINE_QUANTITY + 1)]).is_err());
}
