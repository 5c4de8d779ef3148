// server/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::web::handlers::{
  admin_handlers as admin, cart_handlers as cart, coupon_handlers as coupon, merchant_handlers as merchant,
  message_handlers as message, order_handlers as orders, product_handlers as product, review_handlers as reviews,
  rider_handlers as rider, stats_handlers as stats, store_handlers as store, user_handlers as user,
};
use crate::web::response::ok;

async fn health_check_handler() -> HttpResponse {
  ok(serde_json::json!({ "status": "ok" }))
}

fn user_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/register", web::post().to(user::register))
    .route("/login", web::post().to(user::login))
    .route("/logout", web::post().to(user::logout))
    .route("/info", web::get().to(user::info))
    .route("/update", web::put().to(user::update))
    .route("/delete", web::delete().to(user::delete))
    .route("/cancel", web::delete().to(user::delete))
    .route("/favorite", web::post().to(user::add_favorite))
    .route("/deleteFavorite", web::delete().to(user::remove_favorite))
    .route("/favorite/watch", web::post().to(user::watch_favorites))
    .route("/coupon", web::post().to(user::my_coupons))
    .route("/coupon/view", web::post().to(user::store_coupons))
    .route("/coupon/claim", web::post().to(user::claim_coupon))
    .route("/search", web::post().to(user::search))
    .route("/stores", web::post().to(user::open_stores))
    .route("/store-products", web::post().to(user::store_products))
    .route("/order", web::post().to(user::place_order))
    .route("/history", web::post().to(user::order_history))
    .route("/current", web::post().to(user::current_orders))
    .route("/searchOrder", web::post().to(user::search_order))
    .route("/searchOrderItem", web::post().to(user::search_order_items))
    .route("/review", web::post().to(user::submit_review))
    .route("/updateViewHistory", web::post().to(user::update_view_history))
    .route("/viewHistory", web::post().to(user::view_history));
}

fn cart_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/add", web::post().to(cart::add))
    .route("/view", web::get().to(cart::view))
    .route("/update", web::put().to(cart::update))
    .route("/delete", web::delete().to(cart::delete_line))
    .route("/remove", web::delete().to(cart::clear));
}

fn merchant_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/register", web::post().to(merchant::register))
    .route("/login", web::post().to(merchant::login))
    .route("/logout", web::post().to(merchant::logout))
    .route("/info", web::get().to(merchant::info))
    .route("/update", web::put().to(merchant::update))
    .route("/delete", web::delete().to(merchant::delete));
}

fn store_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/create", web::post().to(store::create))
    .route("/list", web::post().to(store::list))
    .route("/view", web::post().to(store::view))
    .route("/update", web::put().to(store::update))
    .route("/status", web::put().to(store::set_status))
    .route("/delete", web::delete().to(store::delete))
    .route("/storeInfo", web::post().to(store::store_info));
}

fn product_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/create", web::post().to(product::create))
    .route("/view", web::post().to(product::view))
    .route("/store-products", web::post().to(product::store_products))
    .route("/update", web::put().to(product::update))
    .route("/status", web::put().to(product::set_status))
    .route("/delete", web::delete().to(product::delete))
    .route("/productInfo", web::post().to(product::product_info));
}

fn rider_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/register", web::post().to(rider::register))
    .route("/login", web::post().to(rider::login))
    .route("/logout", web::post().to(rider::logout))
    .route("/info", web::get().to(rider::info))
    .route("/update", web::put().to(rider::update))
    .route("/delete", web::delete().to(rider::delete))
    .route("/dispatch-mode", web::put().to(rider::set_dispatch_mode))
    .route("/auto-order-taking", web::post().to(rider::auto_order_taking));
}

fn order_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/available", web::get().to(orders::available))
    .route("/grab", web::put().to(orders::grab))
    .route("/cancel", web::put().to(orders::rider_cancel))
    .route("/rider-update-status", web::put().to(orders::rider_update_status))
    .route("/rider-history-query", web::post().to(orders::rider_history))
    .route("/rider-earnings", web::get().to(orders::rider_earnings))
    .route("/merchant-list", web::post().to(orders::merchant_list))
    .route("/merchant-update", web::put().to(orders::merchant_update));
}

fn admin_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/login", web::post().to(admin::login))
    .route("/logout", web::post().to(admin::logout))
    .route("/userlist", web::post().to(admin::user_list))
    .route("/riderlist", web::post().to(admin::rider_list))
    .route("/merchantlist", web::post().to(admin::merchant_list))
    .route("/storelist", web::post().to(admin::store_list))
    .route("/productlist", web::post().to(admin::product_list))
    .route("/orderlist", web::post().to(admin::order_list))
    .route("/reviewlist", web::post().to(admin::review_list))
    .route("/delete", web::delete().to(admin::delete))
    .route("/search", web::post().to(admin::search))
    .route("/search-order-by-id", web::post().to(admin::search_order_by_id))
    .route("/search-review-by-id", web::post().to(admin::search_review_by_id));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(web::scope("/user").configure(user_routes))
      .service(web::scope("/cart").configure(cart_routes))
      .service(web::scope("/merchant").configure(merchant_routes))
      .service(web::scope("/store").configure(store_routes))
      .service(web::scope("/product").configure(product_routes))
      .service(web::scope("/coupon").route("/create", web::post().to(coupon::create)))
      .service(
        web::scope("/reviews")
          .route("/list", web::post().to(reviews::list))
          .route("/filter", web::post().to(reviews::filter)),
      )
      .service(
        web::scope("/stats")
          .route("/overview", web::post().to(stats::overview))
          .route("/trend", web::post().to(stats::trend))
          .route("/product-volume", web::post().to(stats::product_volume)),
      )
      .service(web::scope("/rider").configure(rider_routes))
      .service(web::scope("/orders").configure(order_routes))
      .service(web::scope("/admin").configure(admin_routes))
      .service(
        web::scope("/message")
          .route("/send", web::post().to(message::send))
          .route("/history", web::post().to(message::history)),
      ),
  );
}
