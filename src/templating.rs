use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

pub const HEADER_TEMPLATE: &str = "_header.html.liquid";
pub const FOOTER_TEMPLATE: &str = "_footer.html.liquid";
pub const INDEX_TEMPLATE: &str = "index.html.liquid";
pub const LEADERBOARD_TEMPLATE: &str = "modules/_leaderboard.html.liquid";

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    fn parse(content: &str) -> Result<liquid::Template, String> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        parser
            .parse(content)
            .map_err(|e| format!("Failed to parse template: {}", e))
    }

    /// Renders a single template with no header or footer.
    pub async fn render_fragment(
        &self,
        template_name: &str,
        globals: &liquid::Object,
    ) -> Result<String, String> {
        let content = self.load_template(template_name).await?;
        Self::parse(&content)?
            .render(globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }

    /// Renders an optional partial. Missing or broken partials log and render empty.
    async fn render_partial(&self, template_name: &str, globals: &liquid::Object) -> String {
        self.render_fragment(template_name, globals)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to render {}: {}", template_name, e);
                String::new()
            })
    }

    /// Renders a page template. Header and footer are rendered with the same
    /// globals and exposed as `header` and `footer`; when a `leaderboard`
    /// value is present the panel is rendered into `leaderboard_component`.
    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;
        let template = Self::parse(&template_content)?;

        let header_content = self.render_partial(HEADER_TEMPLATE, &globals).await;
        let footer_content = self.render_partial(FOOTER_TEMPLATE, &globals).await;

        let leaderboard_rendered = if globals.contains_key("leaderboard") {
            self.render_partial(LEADERBOARD_TEMPLATE, &globals).await
        } else {
            String::new()
        };

        let mut full_globals = globals;
        full_globals.insert(
            "header".into(),
            liquid::model::Value::Scalar(header_content.into()),
        );
        full_globals.insert(
            "footer".into(),
            liquid::model::Value::Scalar(footer_content.into()),
        );
        full_globals.insert(
            "leaderboard_component".into(),
            liquid::model::Value::Scalar(leaderboard_rendered.into()),
        );

        template
            .render(&full_globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }
}
