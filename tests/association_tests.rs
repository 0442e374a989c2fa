mod test_utils;

use std::sync::Arc;

use uuid::Uuid;

use marketplace_backend::{
    entities::user::Role,
    errors::AppError,
    http::clients::MockMediaServiceApi,
    repositories::{
        media::MediaRepository, memory::InMemoryMediaRepo, product::ProductRepository,
    },
};

use test_utils::{principal_of, ProbeControl, TestContext};

#[tokio::test]
async fn associating_media_appends_and_stamps_the_back_reference() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;
    let product = ctx.seed_product(&seller, vec![]).await;
    let media = ctx.seed_media(&seller, None).await;

    let response = ctx
        .product_handler
        .associate_media(product.id, media.id, &principal_of(&seller))
        .await
        .unwrap();

    assert_eq!(response.media_ids, vec![media.id]);

    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.media_ids, vec![media.id]);

    let stamped = ctx.media.find(&media.id).await.unwrap().unwrap();
    assert_eq!(stamped.product_id, Some(product.id));
}

#[tokio::test]
async fn association_succeeds_when_the_stamp_call_fails() {
    let media = Arc::new(InMemoryMediaRepo::default());
    let probes = Arc::new(ProbeControl::default());

    let mut media_client = MockMediaServiceApi::new();
    media_client
        .expect_stamp_product()
        .returning(|_, _| Err(AppError::TransientDependency("stamp timed out".into())));

    let ctx =
        TestContext::spawn_with_media_client(Arc::new(media_client), media, probes).await;
    let seller = ctx.seed_user(Role::Seller).await;
    let product = ctx.seed_product(&seller, vec![]).await;
    let media = ctx.seed_media(&seller, None).await;

    // The append is authoritative; the back-reference stays stale.
    ctx.product_handler
        .associate_media(product.id, media.id, &principal_of(&seller))
        .await
        .unwrap();

    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.media_ids, vec![media.id]);

    let unstamped = ctx.media.find(&media.id).await.unwrap().unwrap();
    assert_eq!(unstamped.product_id, None);
}

#[tokio::test]
async fn associating_against_someone_elses_product_is_forbidden() {
    let ctx = TestContext::spawn().await;
    let owner = ctx.seed_user(Role::Seller).await;
    let intruder = ctx.seed_user(Role::Seller).await;
    let product = ctx.seed_product(&owner, vec![]).await;
    let media = ctx.seed_media(&intruder, None).await;

    let err = ctx
        .product_handler
        .associate_media(product.id, media.id, &principal_of(&intruder))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert!(stored.media_ids.is_empty());
}

#[tokio::test]
async fn associating_against_a_missing_product_is_not_found() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;
    let media = ctx.seed_media(&seller, None).await;

    let err = ctx
        .product_handler
        .associate_media(Uuid::new_v4(), media.id, &principal_of(&seller))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn removal_callback_strips_the_reference_and_tolerates_redelivery() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;
    let media_id = Uuid::new_v4();
    let keeper = Uuid::new_v4();
    let product = ctx.seed_product(&seller, vec![media_id, keeper]).await;

    ctx.product_handler
        .remove_media_from_product(product.id, media_id)
        .await
        .unwrap();

    // Second invocation finds nothing to remove and still succeeds.
    ctx.product_handler
        .remove_media_from_product(product.id, media_id)
        .await
        .unwrap();

    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.media_ids, vec![keeper]);
}

#[tokio::test]
async fn removal_callback_for_a_deleted_product_succeeds() {
    let ctx = TestContext::spawn().await;

    ctx.product_handler
        .remove_media_from_product(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
}

#[tokio::test]
async fn deleting_media_directly_clears_the_forward_reference() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;
    let product = ctx.seed_product(&seller, vec![]).await;
    let media = ctx.seed_media(&seller, None).await;

    ctx.product_handler
        .associate_media(product.id, media.id, &principal_of(&seller))
        .await
        .unwrap();

    ctx.media_handler
        .delete(media.id, &principal_of(&seller))
        .await
        .unwrap();

    assert!(ctx.media.find(&media.id).await.unwrap().is_none());
    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert!(stored.media_ids.is_empty());
}

#[tokio::test]
async fn deleting_someone_elses_media_is_forbidden() {
    let ctx = TestContext::spawn().await;
    let owner = ctx.seed_user(Role::Client).await;
    let intruder = ctx.seed_user(Role::Client).await;
    let media = ctx.seed_media(&owner, None).await;

    let err = ctx
        .media_handler
        .delete(media.id, &principal_of(&intruder))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(ctx.media.find(&media.id).await.unwrap().is_some());
}
