mod feedback;
mod feedback_receiver;
mod token;

pub use feedback::{Feedback, RatingOutOfRange, MAX_RATING};
pub use feedback_receiver::FeedbackReceiver;
pub use token::Token;
