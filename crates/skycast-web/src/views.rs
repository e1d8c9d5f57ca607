//! Inline HTML for the four pages.

use std::fmt::Write;

use skycast_weather::{ArchiveEntry, ForecastView};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body_style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body style=\"{body_style}\">\n\
         <nav><a href=\"/\">Search</a> | <a href=\"/history\">History</a></nav>\n\
         {body}\n</body>\n</html>\n",
        title = escape_html(title),
        body_style = body_style,
        body = body,
    )
}

pub fn render_home(background_color: &str, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Weather Forecast</h1>\n");
    if let Some(message) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(message));
    }
    body.push_str(
        "<form action=\"/results\" method=\"get\">\n\
         <label for=\"Country_Name\">Location</label>\n\
         <input id=\"Country_Name\" name=\"Country_Name\" type=\"text\" required>\n\
         <button type=\"submit\">Get forecast</button>\n\
         </form>",
    );

    let style = format!("background-color: {}", escape_html(background_color));
    page("Weather Forecast", &style, &body)
}

pub fn render_results(view: &ForecastView) -> String {
    let mut body = format!(
        "<h1>{}</h1>\n<p>Forecast from {} to {}</p>\n",
        escape_html(&view.title),
        escape_html(&view.start_time),
        escape_html(&view.end_time),
    );

    body.push_str(
        "<table>\n<tr><th>Date</th><th>Max temp</th><th>Min temp</th><th>Humidity</th></tr>\n",
    );
    for day in &view.forecast {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&day.date),
            day.temp_max,
            day.temp_min,
            day.humidity,
        );
    }
    body.push_str("</table>");

    page(&view.title, "", &body)
}

pub fn render_history(entries: &[ArchiveEntry]) -> String {
    let mut body = String::from("<h1>Query History</h1>\n");

    if entries.is_empty() {
        body.push_str("<p>No saved forecasts yet.</p>");
        return page("Query History", "", &body);
    }

    body.push_str("<ul>\n");
    for entry in entries {
        let _ = writeln!(
            body,
            "<li><a href=\"/download/{}\">{}</a> ({} bytes, {})</li>",
            urlencoding::encode(&entry.file_name),
            escape_html(&entry.file_name),
            entry.size,
            entry.modified.format("%Y-%m-%d %H:%M UTC"),
        );
    }
    body.push_str("</ul>");

    page("Query History", "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::{DayRecord, ForecastSource, LocationQuery, Metric, NormalizedForecast};

    fn view(title: &str) -> ForecastView {
        let mut forecast = NormalizedForecast::default();
        forecast.insert(DayRecord {
            date: "2024-01-01".into(),
            temp_max: Metric::Value(20.0),
            temp_min: Metric::Value(10.0),
            humidity: Metric::NotAvailable,
        });
        let query = LocationQuery::parse(title).unwrap();
        ForecastView::new(&query, forecast, ForecastSource::Upstream, None)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_home_uses_background_color() {
        let html = render_home("lightblue", None);
        assert!(html.contains("background-color: lightblue"));
        assert!(html.contains("name=\"Country_Name\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_home_shows_escaped_error() {
        let html = render_home("white", Some("<b>oops</b>"));
        assert!(html.contains("&lt;b&gt;oops&lt;/b&gt;"));
    }

    #[test]
    fn test_results_table() {
        let html = render_results(&view("London"));
        assert!(html.contains("<h1>London</h1>"));
        assert!(html.contains("<td>2024-01-01</td><td>20</td><td>10</td><td>N/A</td>"));
    }

    #[test]
    fn test_results_escapes_title() {
        let html = render_results(&view("<img src=x>"));
        assert!(html.contains("&lt;img src=x&gt;"));
        assert!(!html.contains("<img src=x>"));
    }

    #[test]
    fn test_empty_history() {
        assert!(render_history(&[]).contains("No saved forecasts yet."));
    }
}
