pub mod reviews;

pub use reviews::{
    create_review, delete_review, delete_reviews_by_post, get_review, get_reviews,
    get_reviews_by_post, get_reviews_by_status, update_review,
};
