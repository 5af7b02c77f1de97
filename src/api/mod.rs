pub mod render;

pub use render::{
    handle_get, handle_get_root, handle_method_not_allowed, handle_post, handle_preflight,
};
