use axum::http::StatusCode;
use serde::{Serialize, Serializer};

#[derive(Debug)]
pub struct Response<T>
where
    T: Serialize,
{
    status: StatusCode,
    body: T,
}

impl<T> Response<T>
where
    T: Serialize,
{
    const DEFAULT_STATUS: StatusCode = StatusCode::OK;

    pub fn new(body: T) -> Self {
        Self {
            status: Self::DEFAULT_STATUS,
            body,
        }
    }

    pub fn with_status(status: impl Into<StatusCode>, body: T) -> Self {
        Self {
            status: status.into(),
            body,
        }
    }
}

impl<T> axum::response::IntoResponse for Response<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        let mut res = axum::Json(&self.body).into_response();
        *res.status_mut() = self.status;

        res
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(serialize_with = "se_status_code_as_u16")]
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn new<S>(code: StatusCode, message: S) -> Self
    where
        S: ToString,
    {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

impl axum::response::IntoResponse for Status {
    fn into_response(self) -> axum::response::Response {
        let mut res = axum::Json(&self).into_response();
        *res.status_mut() = self.code;

        res
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List<T: Serialize> {
    total: u64,
    data: Vec<T>,
}

impl<T: Serialize> List<T> {
    pub fn new<D>(data: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<T>,
    {
        let data = data.into_iter().map(Into::into).collect::<Vec<T>>();

        Self {
            total: data.len() as u64,
            data,
        }
    }
}

fn se_status_code_as_u16<S>(code: &StatusCode, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u16(code.as_u16())
}
