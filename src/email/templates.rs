pub fn render_password_recover(recover_url: &str, minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password recovery</h2>
    <p>Use the link below to set a new password for your catalog account (valid for {minutes} minutes):</p>
    <p><a href="{recover_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Set new password</a></p>
    <p style="color: #666; font-size: 14px;">{recover_url}</p>
    <p style="color: #666; font-size: 14px;">If you didn't request this, you can ignore this email.</p>
</body>
</html>"#
    )
}

pub fn render_password_recover_text(recover_url: &str, minutes: i64) -> String {
    format!(
        "Password recovery\n\n\
         Open the link below to set a new password for your catalog account.\n\
         It is valid for {minutes} minutes.\n\n\
         {recover_url}\n\n\
         If you didn't request this, you can ignore this email.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_variant_carries_bare_link() {
        let text = render_password_recover_text("http://front/recover/abc123", 15);
        assert!(text.contains("\nhttp://front/recover/abc123\n"));
        assert!(text.contains("valid for 15 minutes"));
    }

    #[test]
    fn recover_mail_embeds_link_and_lifetime() {
        let html = render_password_recover("http://front/recover/abc123", 30);
        assert!(html.contains("href=\"http://front/recover/abc123\""));
        assert!(html.contains("valid for 30 minutes"));
    }
}
