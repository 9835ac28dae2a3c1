//! Páginas HTML servidas pelo ZipKey.

use zipkey_registry::Policy;

const STYLE: &str = r#"
  body { font-family: 'Segoe UI', sans-serif; background: #e8f0fe; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; }
  .box { background: #fff; padding: 30px 40px; border-radius: 12px; text-align: center; box-shadow: 0 4px 16px rgba(0,0,0,0.1); }
  h2 { color: #1d4ed8; }
  .code { font-size: 28px; font-weight: bold; color: #10b981; margin: 20px 0; }
  .error { background: #fef2f2; }
  .error h2 { color: #dc2626; font-size: 22px; }
  a { text-decoration: none; color: #3b82f6; font-weight: 500; }
  label { display: block; margin: 6px 0; }
"#;

fn layout(title: &str, body_class: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>{title} - ZipKey</title>
    <style>{STYLE}</style>
  </head>
  <body class="{body_class}">
    <div class="box">
{content}
    </div>
  </body>
</html>
"#
    )
}

pub fn index() -> String {
    layout(
        "Share a File",
        "",
        r#"      <h2>Share a File</h2>
      <form action="/upload" method="post" enctype="multipart/form-data">
        <p><input type="file" name="file" required></p>
        <label><input type="radio" name="expiryOption" value="24h" checked> Expires in 24 hours</label>
        <label><input type="radio" name="expiryOption" value="48h"> Expires in 48 hours</label>
        <label><input type="radio" name="expiryOption" value="once"> One-time download</label>
        <p><button type="submit">Upload</button></p>
      </form>
      <p><a href="/download.html">I have a code</a></p>"#,
    )
}

pub fn download() -> String {
    layout(
        "Download",
        "",
        r#"      <h2>Enter Your Code</h2>
      <form action="/download" method="get">
        <p><input type="text" name="code" inputmode="numeric" pattern="[0-9]{6}" maxlength="6" required></p>
        <p><button type="submit">Download</button></p>
      </form>
      <p><a href="/">Back to Home</a></p>"#,
    )
}

pub fn upload_success(code: &str, policy: Policy) -> String {
    let rule = match policy {
        Policy::Hours24 => "The code works for 24 hours.",
        Policy::Hours48 => "The code works for 48 hours.",
        Policy::OneTime => "The code works for a single download.",
    };
    layout(
        "Upload Successful",
        "",
        &format!(
            r#"      <h2>File Uploaded!</h2>
      <p>Share this code with your friend:</p>
      <div class="code">{code}</div>
      <p>{rule}</p>
      <p><a href="/download.html">Go to Download Page</a></p>
      <p><a href="/index.html">Go to Home</a></p>"#
        ),
    )
}

pub fn invalid_code() -> String {
    layout(
        "Invalid Code",
        "error",
        r#"      <h2>Invalid or Expired Code</h2>
      <p>This file code doesn't exist or has already expired.</p>
      <p><a href="/">Back to Home</a></p>"#,
    )
}
