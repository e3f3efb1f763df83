//! Repository implementations using SeaORM

pub mod book_repository;
pub mod copy_repository;
pub mod location_repository;
pub mod member_repository;

pub use book_repository::SeaOrmBookRepository;
pub use copy_repository::SeaOrmCopyRepository;
pub use location_repository::SeaOrmLocationRepository;
pub use member_repository::SeaOrmMemberRepository;
