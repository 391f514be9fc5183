//! HTML rendering of the service list

use service_catalog::ServiceEntry;
use std::fmt::Write;

/// Page title
pub const TITLE: &str = "Dashboard";

/// Replacement for link targets with an unsafe scheme
pub const UNSAFE_URL: &str = "#ZgotmplZ";

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Render the dashboard page, one link per service in the given order
pub fn render_page(services: &[ServiceEntry]) -> String {
    let mut page = String::new();
    page.push_str("<html>\n");
    let _ = writeln!(page, "<head><title>{}</title></head>", TITLE);
    page.push_str("<body>\n");

    for service in services {
        let _ = writeln!(
            page,
            "<a href=\"{}\">{}</a>",
            escape_html(safe_url(&service.address)),
            escape_html(&service.name)
        );
    }

    page.push_str("</body>\n</html>\n");
    page
}

/// Keep relative URLs and those with a safe scheme; replace the rest
fn safe_url(address: &str) -> &str {
    if let Some((scheme, _)) = address.split_once(':') {
        // A '/' before the ':' means there is no scheme
        if !scheme.contains('/')
            && !SAFE_SCHEMES
                .iter()
                .any(|safe| scheme.eq_ignore_ascii_case(safe))
        {
            return UNSAFE_URL;
        }
    }
    address
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
