use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::db::models::{BlogPost, Project};
use crate::error::ApiError;
use crate::state::AppState;

const FEED_ITEMS: i64 = 50;
const FEED_TITLE: &str = "Portfolio Blog";
const FEED_DESCRIPTION: &str = "Latest articles and insights";
const STATIC_PAGES: [&str; 4] = ["/", "/projects", "/blog", "/certificates"];

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn xml_response(content_type: &'static str, xml: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        xml,
    )
        .into_response()
}

pub fn render_rss(site_url: &str, posts: &[BlogPost]) -> String {
    let mut items = String::new();
    for post in posts {
        let post_url = format!("{}/blog/{}", site_url, post.slug);
        let published = post.published_at.unwrap_or(post.created_at);
        items.push_str(&format!(
            "    <item>\n\
                   <title>{}</title>\n\
                   <link>{}</link>\n\
                   <description>{}</description>\n\
                   <pubDate>{}</pubDate>\n\
                   <guid isPermaLink=\"true\">{}</guid>\n\
                 </item>\n",
            escape_xml(&post.title_en),
            escape_xml(&post_url),
            escape_xml(post.excerpt_en.as_deref().unwrap_or("")),
            rfc822(&published),
            escape_xml(&post_url),
        ));
    }

    let feed_url = format!("{}/blog/feed", site_url);
    let blog_url = format!("{}/blog", site_url);
    let last_build = posts
        .first()
        .map(|p| rfc822(&p.published_at.unwrap_or(p.created_at)))
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        FEED_TITLE,
        escape_xml(&blog_url),
        FEED_DESCRIPTION,
        escape_xml(&feed_url),
        last_build,
        items,
    )
}

pub fn render_sitemap(site_url: &str, posts: &[BlogPost], projects: &[Project]) -> String {
    let mut urls = String::new();
    let mut push = |path: String, lastmod: Option<DateTime<Utc>>| {
        urls.push_str("  <url>\n");
        urls.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&format!("{}{}", site_url, path))
        ));
        if let Some(dt) = lastmod {
            urls.push_str(&format!("    <lastmod>{}</lastmod>\n", dt.format("%Y-%m-%d")));
        }
        urls.push_str("  </url>\n");
    };

    for page in STATIC_PAGES {
        push(page.to_string(), None);
    }
    for post in posts {
        push(format!("/blog/{}", post.slug), Some(post.updated_at));
    }
    for project in projects {
        push(format!("/projects/{}", project.id), Some(project.created_at));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        urls
    )
}

/// GET /blog/feed - RSS 2.0
pub async fn rss_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let posts = state.posts.list_published(None, Some(FEED_ITEMS)).await?;
    let xml = render_rss(&state.config.site_url, &posts);
    Ok(xml_response("application/rss+xml; charset=utf-8", xml))
}

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (posts, projects) = tokio::try_join!(
        state.posts.list_published(None, None),
        state.projects.list(),
    )?;
    let xml = render_sitemap(&state.config.site_url, &posts, &projects);
    Ok(xml_response("application/xml; charset=utf-8", xml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn post(slug: &str, title: &str) -> BlogPost {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        BlogPost {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title_en: title.to_string(),
            title_om: None,
            excerpt_en: Some("Short & sweet".to_string()),
            excerpt_om: None,
            content_en: "# Hi".to_string(),
            content_om: None,
            image_url: None,
            tags: vec![],
            published: true,
            published_at: Some(at),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<title>"), "&lt;title&gt;");
        assert_eq!(escape_xml("\"quote\""), "&quot;quote&quot;");
    }

    #[test]
    fn test_rfc822_format() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(rfc822(&dt), "Mon, 15 Jan 2024 12:00:00 +0000");
    }

    #[test]
    fn test_rss_items_are_escaped() {
        let xml = render_rss("https://site.test", &[post("rust-tips", "Rust <tips>")]);
        assert!(xml.contains("<title>Rust &lt;tips&gt;</title>"));
        assert!(xml.contains("<link>https://site.test/blog/rust-tips</link>"));
        assert!(xml.contains("<description>Short &amp; sweet</description>"));
        assert!(xml.contains("href=\"https://site.test/blog/feed\""));
        assert!(xml.contains("<lastBuildDate>Mon, 15 Jan 2024 12:00:00 +0000</lastBuildDate>"));
    }

    #[test]
    fn test_empty_feed_is_valid_channel() {
        let xml = render_rss("https://site.test", &[]);
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_sitemap_lists_static_pages_and_posts() {
        let xml = render_sitemap("https://site.test", &[post("hello", "Hello")], &[]);
        assert!(xml.contains("<loc>https://site.test/</loc>"));
        assert!(xml.contains("<loc>https://site.test/certificates</loc>"));
        assert!(xml.contains("<loc>https://site.test/blog/hello</loc>"));
        assert!(xml.contains("<lastmod>2024-01-15</lastmod>"));
    }
}
