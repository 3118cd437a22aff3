use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    body::Bytes,
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;

#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> Json<T> {
    pub fn render(&self) -> Result<RenderedJson, serde_json::Error> {
        serde_json::to_vec(&self.0).map(|json| RenderedJson(json.into()))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(rendered) => rendered.into_response(),
            Err(err) => ServerError::JsonResponse(err).into_response(),
        }
    }
}

/// An already serialized JSON body, cheap to clone and keep in the page cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedJson(Bytes);

impl IntoResponse for RenderedJson {
    fn into_response(self) -> Response {
        (TypedHeader(ContentType::json()), self.0).into_response()
    }
}
