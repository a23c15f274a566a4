//! Index page listing the registered debug routes.

use std::fmt::Write;

use crate::observability::Level;

/// One link on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: String,
    pub description: String,
}

/// Registered pages, in registration order.
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pages: Vec<Page>,
}

impl IndexPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, path: impl Into<String>, description: impl Into<String>) {
        self.pages.push(Page {
            path: path.into(),
            description: description.into(),
        });
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Render the page with `current` preselected in the level form.
    pub fn render(&self, current: Level) -> String {
        let mut items = String::new();
        for page in &self.pages {
            let _ = write!(
                items,
                "\t\t<li>\n\t\t\t<a href=\"{path}\">{path}</a> <span>{description}</span>\n\t\t</li>\n",
                path = escape(&page.path),
                description = escape(&page.description),
            );
        }

        let mut options = String::new();
        for level in Level::ALL {
            let selected = if level == current { " selected=\"selected\"" } else { "" };
            let _ = writeln!(
                options,
                "\t\t\t<option value=\"{}\"{}>{}</option>",
                level.token(),
                selected,
                level.as_str()
            );
        }

        format!(
            r#"<html>
<title>Chat Service Debug</title>
<body>
	<h2>Chat Service Debug</h2>
	<ul>
{items}	</ul>

	<h2>Log Level</h2>
	<p>Current: <b id="log-level-current">{current}</b></p>
	<form onSubmit="putLogLevel(); return false;">
		<select id="log-level-select" name="level">
{options}		</select>
		<input type="submit" value="Change"></input>
	</form>

	<script>
	function putLogLevel() {{
		const req = new XMLHttpRequest();
		req.open('PUT', '/log/level', false);
		req.setRequestHeader("Content-Type", "application/x-www-form-urlencoded");
		req.onload = function() {{ window.location.reload(); }};
		req.send('level=' + document.getElementById('log-level-select').value);
	}};
	</script>
</body>
</html>
"#,
            current = current.as_str(),
        )
    }
}

/// Minimal HTML escaping for text and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_pages_in_registration_order() {
        let mut index = IndexPage::new();
        index.add_page("/version", "Get build information");
        index.add_page("/debug/pprof/", "Get std profiler");

        let html = index.render(Level::Info);
        let first = html.find("/version").unwrap();
        let second = html.find("/debug/pprof/").unwrap();
        assert!(first < second);
        assert!(html.contains("<span>Get build information</span>"));
    }

    #[test]
    fn preselects_current_level() {
        let html = IndexPage::new().render(Level::Warn);
        assert!(html.contains(r#"<option value="warn" selected="selected">WARN</option>"#));
        assert!(html.contains(r#"<option value="info">INFO</option>"#));
        assert!(html.contains(r#"<b id="log-level-current">WARN</b>"#));
    }

    #[test]
    fn escapes_markup() {
        let mut index = IndexPage::new();
        index.add_page("/x?a=1&b=2", "<script>");
        let html = index.render(Level::Info);
        assert!(html.contains("/x?a=1&amp;b=2"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<span><script>"));
    }
}
