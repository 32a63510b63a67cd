pub mod posts;

pub use posts::{
    create_post, delete_post, get_post, get_posts, search_posts, update_post,
};
