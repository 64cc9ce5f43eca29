pub(crate) mod health_check_controller;
pub(crate) mod post_controller;
pub(crate) mod subscription_controller;
pub(crate) mod user_session_controller;
pub(crate) mod vapid_key_controller;
