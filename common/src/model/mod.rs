pub mod coupon;
pub mod link_config;
pub mod response;
pub mod upload;
pub mod user;
