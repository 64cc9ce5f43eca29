pub(crate) mod post;
pub(crate) mod subscription;
pub(crate) mod user;
