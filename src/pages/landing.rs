//! Landing page: the hero background image is the only dynamic content.

use super::{BuildContext, RenderError, image_target};
use crate::assets::ResolveOptions;
use std::path::PathBuf;

pub const TEMPLATE: &str = "index.html";
const HERO_ID: &str = "hero-background";

/// Render `index.html`. Asset lookup is strict: a failed image query fails
/// the page rather than shipping a landing page without its hero.
pub fn render(ctx: &mut BuildContext) -> Result<PathBuf, RenderError> {
    let mut doc = ctx.load(TEMPLATE)?;
    let landing = &ctx.config.landing;
    let hero = image_target(
        &doc,
        HERO_ID,
        &landing.hero_code,
        &landing.hero_params,
        &landing.hero_alt,
    );
    let options = ResolveOptions {
        targets: vec![hero],
        strict: true,
        ..ResolveOptions::default()
    };
    ctx.inject(&mut doc, &options)?;
    ctx.write(TEMPLATE, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use crate::test_helpers::*;
    use serde_json::json;

    #[test]
    fn hero_gets_configured_params_and_cms_alt() {
        let site = setup_site();
        let content = MockContent::new(|_| {
            Ok(json!({"imageStaticCollection": {"items": [
                {"code": "hero-background", "altDiscription": "Audience at TEDxKI",
                 "file": {"url": "//images.example/hero.jpg"}}
            ]}}))
        });
        let mut ctx = test_context(&site, &content);
        render(&mut ctx).unwrap();

        let doc = read_output(&site, TEMPLATE);
        let hero = by_id(&doc, HERO_ID);
        assert_eq!(
            hero.attr("src"),
            Some("https://images.example/hero.jpg?fm=webp&q=86&w=1400")
        );
        assert_eq!(hero.attr("alt"), Some("Audience at TEDxKI"));
        assert_eq!(content.calls()[0].variables["codes"], json!(["hero-background"]));
    }

    #[test]
    fn image_query_failure_fails_the_page() {
        let site = setup_site();
        let content = MockContent::new(|_| Err(ContentError::Timeout { ms: 25_000 }));
        let mut ctx = test_context(&site, &content);
        let err = render(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Content(ContentError::Timeout { ms: 25_000 })
        ));
        assert!(!site.path().join("dist").join(TEMPLATE).exists());
    }
}
