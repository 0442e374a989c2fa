use actix_web::web;

use crate::handlers::{
    media::{delete_media, get_media, probe_media, stamp_product},
    products::{
        associate_media, cleanup_orphaned_media, create_product, delete_product, get_product,
        remove_media_callback,
    },
    system::health_check,
    users::{delete_user, get_user, me},
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);

    cfg.service(me)
        .service(get_user)
        .service(delete_user);

    cfg.service(create_product)
        .service(get_product)
        .service(delete_product)
        .service(associate_media)
        .service(remove_media_callback)
        .service(cleanup_orphaned_media);

    // probe_media must register before get_media so HEAD doesn't fall
    // through to the GET handler.
    cfg.service(probe_media)
        .service(get_media)
        .service(stamp_product)
        .service(delete_media);
}
