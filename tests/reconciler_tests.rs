mod test_utils;

use uuid::Uuid;

use marketplace_backend::{entities::user::Role, repositories::product::ProductRepository};

use test_utils::TestContext;

#[tokio::test]
async fn sweep_prunes_dangling_references_and_keeps_live_ones() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;

    let live = ctx.seed_media(&seller, None).await;
    let dangling = Uuid::new_v4();
    let product = ctx.seed_product(&seller, vec![live.id, dangling]).await;

    let summary = ctx.product_handler.cleanup_orphaned_media().await.unwrap();

    assert_eq!(summary.products_checked, 1);
    assert_eq!(summary.products_repaired, 1);
    assert_eq!(summary.references_removed, 1);
    assert_eq!(
        summary.message(),
        "Cleaned up 1 orphaned media references from products"
    );

    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.media_ids, vec![live.id]);
}

#[tokio::test]
async fn indeterminate_probes_keep_the_reference() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;

    // The id resolves to nothing, but the probe can't say so definitively.
    let unreachable = Uuid::new_v4();
    ctx.probes.mark_indeterminate(unreachable);
    let product = ctx.seed_product(&seller, vec![unreachable]).await;

    let summary = ctx.product_handler.cleanup_orphaned_media().await.unwrap();

    assert_eq!(summary.products_repaired, 0);
    assert_eq!(summary.references_removed, 0);

    let stored = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(stored.media_ids, vec![unreachable]);
}

#[tokio::test]
async fn clean_products_are_left_untouched() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;

    let media = ctx.seed_media(&seller, None).await;
    let product = ctx.seed_product(&seller, vec![media.id]).await;
    let bare = ctx.seed_product(&seller, vec![]).await;
    let before = ctx.products.find(&product.id).await.unwrap().unwrap();

    let summary = ctx.product_handler.cleanup_orphaned_media().await.unwrap();

    assert_eq!(summary.products_checked, 2);
    assert_eq!(summary.products_repaired, 0);
    assert_eq!(summary.references_removed, 0);

    let after = ctx.products.find(&product.id).await.unwrap().unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert!(ctx.products.find(&bare.id).await.unwrap().is_some());
}

#[tokio::test]
async fn repeated_sweeps_converge() {
    let ctx = TestContext::spawn().await;
    let seller = ctx.seed_user(Role::Seller).await;

    ctx.seed_product(&seller, vec![Uuid::new_v4(), Uuid::new_v4()])
        .await;

    let first = ctx.product_handler.cleanup_orphaned_media().await.unwrap();
    assert_eq!(first.references_removed, 2);

    let second = ctx.product_handler.cleanup_orphaned_media().await.unwrap();
    assert_eq!(second.references_removed, 0);
    assert_eq!(second.products_repaired, 0);
}
