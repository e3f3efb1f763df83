use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::list_books,
        api::books::get_book,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::transaction::issue_copy,
        api::transaction::return_transaction,
        api::search::search_books,
        api::dashboard::get_dashboard,
    ),
    tags(
        (name = "libdesk", description = "Library desk API")
    )
)]
pub struct ApiDoc;
