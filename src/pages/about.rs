//! About page: hero and story images.

use super::{BuildContext, RenderError, image_target};
use crate::assets::ResolveOptions;
use std::path::PathBuf;

pub const TEMPLATE: &str = "sites/about/about.html";
const HERO_ID: &str = "aboutHeroImage";
const STORY_ID: &str = "aboutStoryImage";

/// Render the about page. Image failures degrade to placeholders.
pub fn render(ctx: &mut BuildContext) -> Result<PathBuf, RenderError> {
    let mut doc = ctx.load(TEMPLATE)?;
    let about = &ctx.config.about;
    let codes = about.codes(&ctx.config.landing.hero_code);
    let hero_code = codes.first().map(String::as_str).unwrap_or_default();

    let hero = image_target(&doc, HERO_ID, hero_code, &about.hero_params, &about.hero_alt);
    // A single listed code leaves the story on the hero's resolved code.
    let story_default = codes.get(1).map_or(hero.code.as_str(), String::as_str);
    let story = image_target(
        &doc,
        STORY_ID,
        story_default,
        &about.story_params,
        &about.story_alt,
    );

    let options = ResolveOptions {
        targets: vec![hero, story],
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

    fn assets() -> MockContent {
        MockContent::new(|_| {
            Ok(json!({"imageStaticCollection": {"items": [
                {"code": "hero-background", "file": {"url": "https://cdn/hero.jpg", "description": "Stage"}},
                {"code": "story", "file": {"url": "https://cdn/story.jpg"}}
            ]}}))
        })
    }

    #[test]
    fn hero_and_story_share_one_query() {
        let site = setup_site();
        let content = assets();
        let mut ctx = test_context(&site, &content);
        ctx.config.about.story_code = Some("story".into());
        render(&mut ctx).unwrap();

        assert_eq!(content.calls().len(), 1);
        let doc = read_output(&site, TEMPLATE);
        let hero = by_id(&doc, HERO_ID);
        assert_eq!(hero.attr("src"), Some("https://cdn/hero.jpg?fm=webp&q=86&w=1400"));
        assert_eq!(hero.attr("alt"), Some("Stage"));
        let story = by_id(&doc, STORY_ID);
        assert_eq!(story.attr("src"), Some("https://cdn/story.jpg?fm=webp&q=84&w=1200"));
        assert_eq!(story.attr("alt"), Some("TED community"));
    }

    #[test]
    fn story_defaults_to_hero_code() {
        let site = setup_site();
        let content = assets();
        let mut ctx = test_context(&site, &content);
        render(&mut ctx).unwrap();

        assert_eq!(
            content.calls()[0].variables["codes"],
            json!(["hero-background"])
        );
        let doc = read_output(&site, TEMPLATE);
        assert_eq!(
            by_id(&doc, STORY_ID).attr("src"),
            Some("https://cdn/hero.jpg?fm=webp&q=84&w=1200")
        );
    }

    #[test]
    fn query_failure_still_renders_page() {
        let site = setup_site();
        let content = MockContent::new(|_| Err(ContentError::Query("offline".into())));
        let mut ctx = test_context(&site, &content);
        render(&mut ctx).unwrap();
        let doc = read_output(&site, TEMPLATE);
        assert_eq!(by_id(&doc, HERO_ID).attr("alt"), Some("TEDxKI community"));
    }
}
