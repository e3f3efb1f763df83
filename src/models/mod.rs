pub mod book;
pub mod copy;
pub mod location;
pub mod member;
pub mod transaction;

pub use book::Book;
pub use member::MemberDto;
