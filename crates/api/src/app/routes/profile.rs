use axum::Json;

use crate::app::dto::UserView;
use crate::context::CurrentPrincipal;

pub async fn profile(CurrentPrincipal(principal): CurrentPrincipal) -> Json<UserView> {
    Json(UserView::from(&principal))
}
