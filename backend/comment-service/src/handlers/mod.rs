pub mod comments;

pub use comments::{
    create_comment, delete_comment, get_comment, get_comments, get_comments_by_post,
    update_comment,
};
