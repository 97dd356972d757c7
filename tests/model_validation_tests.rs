use item_vault::models::{
    CreateItemRequest, DeleteItemResponse, Item, UpdateUserRequest, User, UserRead,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_item_json_shape() {
    let item = Item {
        id: 3,
        item_name: "Widget".to_string(),
        price: 9.99,
        phone: "555-0100".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&item).unwrap(),
        json!({"id": 3, "item_name": "Widget", "price": 9.99, "phone": "555-0100"})
    );
}

#[test]
fn test_create_request_requires_every_field() {
    let missing_phone = serde_json::from_value::<CreateItemRequest>(
        json!({"item_name": "Widget", "price": 1.0}),
    );
    assert!(missing_phone.is_err());

    let price_as_string = serde_json::from_value::<CreateItemRequest>(
        json!({"item_name": "Widget", "price": "1.0", "phone": "x"}),
    );
    assert!(price_as_string.is_err());

    // Integers are accepted for price, and no range is enforced.
    let negative = serde_json::from_value::<CreateItemRequest>(
        json!({"item_name": "Widget", "price": -5, "phone": ""}),
    )
    .unwrap();
    assert_eq!(negative.price, -5.0);
}

#[test]
fn test_user_read_hides_password_hash() {
    let user = User {
        id: Uuid::new_v4(),
        email: "a@example.com".to_string(),
        hashed_password: "$argon2id$v=19$...".to_string(),
        is_active: true,
        is_verified: false,
        is_superuser: false,
    };

    let json_output = serde_json::to_string(&UserRead::from(user)).unwrap();
    assert!(!json_output.contains("hashed_password"));
    assert!(!json_output.contains("argon2"));
    assert!(json_output.contains(r#""is_verified":false"#));
}

#[test]
fn test_delete_response_status_matches_http_status() {
    assert_eq!(
        serde_json::to_value(DeleteItemResponse::deleted()).unwrap(),
        json!({"detail": "item deleted", "status_code": 200})
    );
}

#[test]
fn test_update_user_request_optionality() {
    let partial = UpdateUserRequest {
        is_verified: Some(true),
        ..Default::default()
    };

    let json_output = serde_json::to_string(&partial).unwrap();
    assert_eq!(json_output, r#"{"is_verified":true}"#);

    let empty: UpdateUserRequest = serde_json::from_str("{}").unwrap();
    assert!(empty.is_active.is_none() && empty.is_superuser.is_none());
}
