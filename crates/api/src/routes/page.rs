//! HTML rendering for the estimate form
//!
//! Markup only; styling is left to whoever hosts the page.

use data_validator::ProfileForm;
use feature_engine::{
    Categorical, GameGenre, Gender, PlayFrequency, Platform, RawProfile, TrainingSchema,
};
use inference_engine::{Estimate, ModelKind};
use std::fmt::Write;

/// Age preselected on a fresh form
const DEFAULT_AGE: i64 = 30;

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn field_title(field: &str) -> &'static str {
    match field {
        "age" => "Age",
        "gender" => "Gender",
        "genre" => "Favourite game genre",
        "platform" => "Platform",
        "frequency" => "Play frequency",
        _ => "Field",
    }
}

fn select<T: Categorical>(html: &mut String, title: &str, selected: Option<&str>) {
    let _ = writeln!(html, "<label for=\"{0}\">{1}</label>", T::FIELD, title);
    let _ = writeln!(html, "<select id=\"{0}\" name=\"{0}\">", T::FIELD);
    for label in T::labels() {
        let mark = if selected.map(str::trim) == Some(label) { " selected" } else { "" };
        let label = escape_html(label);
        let _ = writeln!(html, "<option value=\"{0}\"{1}>{0}</option>", label, mark);
    }
    html.push_str("</select>\n");
}

fn form(html: &mut String, previous: Option<&ProfileForm>, age_range: (i64, i64)) {
    let age = previous.and_then(|f| f.age).unwrap_or(DEFAULT_AGE);

    html.push_str("<form method=\"post\" action=\"/estimate\">\n<h2>Your gamer profile</h2>\n");
    let _ = writeln!(
        html,
        "<label for=\"age\">{}</label>\n<input id=\"age\" name=\"age\" type=\"number\" min=\"{}\" max=\"{}\" step=\"1\" value=\"{}\">",
        field_title("age"),
        age_range.0,
        age_range.1,
        age
    );
    select::<Gender>(html, field_title("gender"), previous.and_then(|f| f.gender.as_deref()));
    select::<GameGenre>(html, field_title("genre"), previous.and_then(|f| f.genre.as_deref()));
    select::<Platform>(html, field_title("platform"), previous.and_then(|f| f.platform.as_deref()));
    select::<PlayFrequency>(
        html,
        field_title("frequency"),
        previous.and_then(|f| f.frequency.as_deref()),
    );
    html.push_str("<button type=\"submit\">Estimate my spend</button>\n</form>\n");
}

fn wrap(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Gamer Spend Estimator</title>\n</head>\n<body>\n<h1>Gamer Spend Estimator</h1>\n<p>Find out how much you could invest in video games</p>\n{}</body>\n</html>\n",
        body
    )
}

/// Empty form
pub fn render_form(age_range: (i64, i64)) -> String {
    let mut body = String::new();
    form(&mut body, None, age_range);
    wrap(&body)
}

/// Form followed by the estimate, the echoed profile and the encoded row
pub fn render_estimate(
    profile: &RawProfile,
    estimate: &Estimate,
    schema: &TrainingSchema,
    age_range: (i64, i64),
) -> String {
    let mut body = String::new();
    form(&mut body, Some(&ProfileForm::from(profile)), age_range);

    body.push_str("<h2>Your data</h2>\n<table>\n<tr>");
    for (field, _) in profile.echo() {
        let _ = write!(body, "<th>{}</th>", field_title(field));
    }
    body.push_str("</tr>\n<tr>");
    for (_, value) in profile.echo() {
        let _ = write!(body, "<td>{}</td>", escape_html(&value));
    }
    body.push_str("</tr>\n</table>\n");

    let models: Vec<&str> = ModelKind::ALL.iter().map(ModelKind::display_name).collect();
    let _ = writeln!(
        body,
        "<h2>Gamer spend estimate</h2>\n<p class=\"prediction-result\">Based on your profile, you could spend around: <b>{}</b> on video games.</p>\n<p class=\"model-info\">Models used: {}</p>",
        escape_html(&estimate.formatted()),
        models.join(", ")
    );

    body.push_str("<details>\n<summary>Model input</summary>\n<table>\n");
    for (column, value) in estimate.features.named_values(schema) {
        let _ = writeln!(body, "<tr><td>{}</td><td>{}</td></tr>", escape_html(column), value);
    }
    body.push_str("</table>\n</details>\n");
    wrap(&body)
}

/// Form followed by an error message in place of the result
pub fn render_error(previous: Option<&ProfileForm>, message: &str, age_range: (i64, i64)) -> String {
    let mut body = String::new();
    form(&mut body, previous, age_range);
    let _ = writeln!(body, "<p class=\"error\" role=\"alert\">{}</p>", escape_html(message));
    wrap(&body)
}
