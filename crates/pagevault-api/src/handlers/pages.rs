//! Minimal static HTML forms for the browser flow.

pub fn login_page(error: Option<&str>, next: Option<&str>) -> String {
    let error_html = match error {
        Some("invalid_credentials") => {
            "<p class=\"error\">Invalid username or password.</p>".to_string()
        }
        Some(other) => format!("<p class=\"error\">{}</p>", escape(other)),
        None => String::new(),
    };
    let next_html = next
        .map(|n| format!("<input type=\"hidden\" name=\"next\" value=\"{}\">", escape(n)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>PageVault - Log in</title></head>
<body>
<h1>Log in</h1>
{error_html}
<form method="post" action="/login">
{next_html}
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p><a href="/register">Create an account</a></p>
</body>
</html>
"#
    )
}

pub fn register_page() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>PageVault - Register</title></head>
<body>
<h1>Register</h1>
<form method="post" action="/register">
<label>Username <input type="text" name="username" minlength="3" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" minlength="8" required></label>
<label>Confirm password <input type="password" name="confirm_password" minlength="8" required></label>
<button type="submit">Register</button>
</form>
<p><a href="/login">Back to login</a></p>
</body>
</html>
"#
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_escapes_next() {
        let html = login_page(None, Some("/files\"><script>"));
        assert!(html.contains("/files&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_login_page_error_message() {
        let html = login_page(Some("invalid_credentials"), None);
        assert!(html.contains("Invalid username or password."));
    }
}
