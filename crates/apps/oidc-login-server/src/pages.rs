//! Static pages. No templating engine: the landing page has a single
//! placeholder for the provider links and the confirmation fragment is
//! built with `format!`.

const INDEX_TEMPLATE: &str = include_str!("../static/index.html");
const PROVIDERS_PLACEHOLDER: &str = "{{providers}}";

/// Shown on the confirmation page when the admin API could not be reached
pub const DEGRADED_NOTICE: &str = "Your applications could not be loaded right now.";

/// Landing page with one sign-in link per registered provider.
///
/// Provider ids are restricted to `[A-Za-z0-9_-]` at configuration time, so
/// they are safe to interpolate into the markup.
pub fn index_page<'a>(provider_ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut ids: Vec<&str> = provider_ids.into_iter().collect();
    ids.sort_unstable();

    let links = ids
        .iter()
        .map(|id| format!(r#"<a class="button" href="/auth/{id}">Sign in with {id}</a>"#))
        .collect::<Vec<_>>()
        .join("\n        ");

    INDEX_TEMPLATE.replace(PROVIDERS_PLACEHOLDER, &links)
}

pub fn success_page(notice: Option<&str>) -> String {
    let notice = notice
        .map(|text| format!(r#"<p style="color: #a15c00;">{text}</p>"#))
        .unwrap_or_default();

    format!(
        r#"
      <div style="
          background-color: #fff;
          padding: 40px;
          border-radius: 8px;
          box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
          text-align: center;
      ">
          <h1 style="
              color: #333;
              margin-bottom: 20px;
          ">You have successfully signed in!</h1>
          {notice}
      </div>
"#
    )
}
