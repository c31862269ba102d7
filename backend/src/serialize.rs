use actix_web::{
    body::EitherBody,
    http::header::{Accept, Header},
    http::StatusCode,
    web::Json,
    HttpRequest, HttpResponse, HttpResponseBuilder, Responder,
};
use eyre::Context;
use serde::Serialize;

/// True when the request's `Accept` header ranks `text/csv` above JSON.
pub fn accepts_csv(request: &HttpRequest) -> bool {
    let ranked = Accept::parse(request)
        .ok()
        .map(|accept| accept.ranked())
        .unwrap_or_default();

    for mime in ranked {
        match mime.essence_str() {
            "application/json" => return false, // JSON is the default
            "text/csv" => return true,
            _ => {}
        }
    }

    false
}

/// Responder for the flat listing payloads: JSON by default, a CSV export
/// when the client prefers it.
pub struct Tabular<T: Serialize>(pub Vec<T>);

impl<T: Serialize> Tabular<T> {
    fn to_csv(&self) -> eyre::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for row in &self.0 {
            writer
                .serialize(row)
                .wrap_err("Failed to serialize listing row as csv")?;
        }

        let bytes = writer.into_inner().wrap_err("Failed to flush csv writer")?;
        String::from_utf8(bytes).wrap_err("csv output was not valid UTF-8")
    }
}

impl<T: Serialize> Responder for Tabular<T> {
    type Body = EitherBody<String>;

    fn respond_to(self, request: &HttpRequest) -> HttpResponse<Self::Body> {
        if accepts_csv(request) {
            match self.to_csv() {
                Ok(body) => {
                    return HttpResponseBuilder::new(StatusCode::OK)
                        .insert_header(("Content-Type", "text/csv"))
                        .message_body(EitherBody::new(body))
                        .unwrap();
                }
                Err(e) => log::error!("csv rendering failed, falling back to json: {e:?}"),
            }
        }

        Json(self.0).respond_to(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showbill_lib::ShowListing;

    #[test]
    fn listings_render_as_csv_rows() {
        let rows = Tabular(vec![ShowListing {
            venue_id: 1,
            venue_name: "The Musical Hop".into(),
            artist_id: 4,
            artist_name: "Guns N Petals".into(),
            artist_image_link: None,
            start_time: "2035-05-21 21:30:00".into(),
        }]);

        let csv = rows.to_csv().unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("venue_id,venue_name,artist_id,artist_name,artist_image_link,start_time")
        );
        assert_eq!(
            lines.next(),
            Some("1,The Musical Hop,4,Guns N Petals,,2035-05-21 21:30:00")
        );
    }
}
