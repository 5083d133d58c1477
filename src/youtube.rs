use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;
use tracing::debug;

/// Download the first thumbnail in `urls` that responds and decodes.
pub async fn fetch_thumbnail(client: &Client, urls: &[String]) -> Result<DynamicImage> {
  for url in urls {
    match client.get(url).send().await {
      Ok(response) if response.status().is_success() => {
        let image_bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
        let image = image::load_from_memory(&image_bytes)
          .with_context(|| format!("Failed to decode image from memory (URL: {})", url))?;
        return Ok(image);
      }
      Ok(response) => debug!(url = %url, status = %response.status(), "thumbnail: skipping"),
      Err(e) => debug!(url = %url, err = %e, "thumbnail: request failed"),
    }
  }
  Err(anyhow!("No thumbnail could be fetched ({} candidates)", urls.len()))
}

/// Open `url` in the platform's default browser without blocking the UI.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to launch {}", cmd))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}
