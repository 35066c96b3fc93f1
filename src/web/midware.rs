use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::web::{log, ClientError, Error, REQUEST_ID_HEADER};

/// The JSON body sent to the client whenever a handler returned an `Error`.
#[derive(Debug, Serialize)]
struct ClientErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    req_id: String,
}

impl<'a> ClientErrorBody<'a> {
    fn new(client_error: &'a ClientError, req_id: Uuid) -> Self {
        let (details, code) = match client_error {
            ClientError::SignupFailed { details, code } => (details.as_deref(), code.as_deref()),
            _ => (None, None),
        };

        Self {
            error: client_error.to_string(),
            details,
            code,
            req_id: req_id.to_string(),
        }
    }
}

pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    // The request id header is already propagated to the response at this point.
    let uuid = resp
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(Uuid::new_v4);

    let web_error = resp.extensions().get::<Arc<Error>>().map(|er| er.as_ref());
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    if let (Some(er), Some((status, _))) = (web_error, &client_status_and_error) {
        if status.is_server_error() {
            tracing::error!("SERVER ERROR: {er} ID: {uuid}");
        }
    }

    let err_resp = client_status_and_error.as_ref().map(|(status, cl_err)| {
        let client_error_body = ClientErrorBody::new(cl_err, uuid);

        let mut err_resp = (*status, Json(client_error_body)).into_response();
        if let Some(req_id) = resp.headers().get(REQUEST_ID_HEADER) {
            err_resp
                .headers_mut()
                .insert(REQUEST_ID_HEADER, req_id.clone());
        }
        err_resp
    });

    log::log_request(
        uuid,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}
