use foundation::{Bounds, Coordinate};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use streaming::{BoxFuture, FetchError, Pixel, PixelRecord, PixelSource, TileSource};

fn status_error(status: StatusCode) -> Option<FetchError> {
    if status == StatusCode::NOT_FOUND {
        Some(FetchError::NotFound)
    } else if !status.is_success() {
        Some(FetchError::Status(status.as_u16()))
    } else {
        None
    }
}

fn network(err: reqwest::Error) -> FetchError {
    FetchError::Network(err.to_string())
}

async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    let resp = request.send().await.map_err(network)?;
    match status_error(resp.status()) {
        Some(err) => Err(err),
        None => Ok(resp),
    }
}

/// Tile images over HTTP. A 404 is a known-absent tile.
#[derive(Debug, Clone)]
pub struct HttpTiles {
    client: Client,
}

impl HttpTiles {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl TileSource for HttpTiles {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let resp = send(self.client.get(url)).await?;
            let bytes = resp.bytes().await.map_err(network)?;
            Ok(bytes.to_vec())
        })
    }
}

/// Pixel regions from `GET {base}/pixels?x_gte&x_lte&y_gte&y_lte`.
#[derive(Debug, Clone)]
pub struct HttpPixels {
    client: Client,
    base_url: String,
}

impl HttpPixels {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn region_url(&self) -> String {
        format!("{}/pixels", self.base_url.trim_end_matches('/'))
    }
}

pub fn region_query(bounds: Bounds) -> [(&'static str, u32); 4] {
    [
        ("x_gte", bounds.top_left.x),
        ("x_lte", bounds.bottom_right.x),
        ("y_gte", bounds.top_left.y),
        ("y_lte", bounds.bottom_right.y),
    ]
}

impl PixelSource for HttpPixels {
    fn query_region(&self, bounds: Bounds) -> BoxFuture<'_, Result<Vec<(Coordinate, Pixel)>, FetchError>> {
        Box::pin(async move {
            let request = self.client.get(self.region_url()).query(&region_query(bounds));
            let resp = send(request).await?;
            let records: Vec<PixelRecord> = resp.json().await.map_err(network)?;
            Ok(records.into_iter().map(Into::into).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpPixels, region_query, status_error};
    use foundation::Bounds;
    use reqwest::{Client, StatusCode};
    use streaming::FetchError;

    #[test]
    fn statuses_map_to_fetch_errors() {
        assert_eq!(status_error(StatusCode::OK), None);
        assert_eq!(status_error(StatusCode::NOT_FOUND), Some(FetchError::NotFound));
        assert_eq!(status_error(StatusCode::BAD_GATEWAY), Some(FetchError::Status(502)));
    }

    #[test]
    fn region_requests_carry_inclusive_bounds() {
        let pixels = HttpPixels::new(Client::new(), "http://host/api/");
        assert_eq!(pixels.region_url(), "http://host/api/pixels");
        assert_eq!(
            region_query(Bounds::from_corners(1, 2, 3, 4)),
            [("x_gte", 1), ("x_lte", 3), ("y_gte", 2), ("y_lte", 4)]
        );
    }
}
