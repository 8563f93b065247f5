use crate::bulk::SceneWriter;
use crate::model::{GroupedEntity, Light, NewScene, ResourceType, Scene};
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Standard CLIP v2 `{errors, data}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    errors: Vec<ApiError>,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    description: String,
}

/// Blocking client for a bridge's local CLIP v2 resource API.
///
/// The bridge serves HTTPS with a self-signed certificate, so certificate
/// verification is disabled; authentication is the per-request
/// `hue-application-key` header.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: Url,
    http: Client,
}

impl BridgeClient {
    pub fn new(base_url: &str, application_key: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).context("parsing bridge URL")?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "hue-application-key",
            HeaderValue::from_str(application_key)
                .context("application key is not a valid header value")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .user_agent(HeaderValue::from_static("huectl/0.1"))
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
        })
    }

    /// URL for a bridge reachable at `ip`.
    pub fn base_url_for_ip(ip: &str) -> String {
        format!("https://{ip}")
    }

    pub fn list_lights(&self) -> Result<Vec<Light>> {
        self.list_as(ResourceType::Light)
    }

    pub fn list_scenes(&self) -> Result<Vec<Scene>> {
        self.list_as(ResourceType::Scene)
    }

    pub fn list_rooms(&self) -> Result<Vec<GroupedEntity>> {
        self.list_as(ResourceType::Room)
    }

    pub fn list_zones(&self) -> Result<Vec<GroupedEntity>> {
        self.list_as(ResourceType::Zone)
    }

    /// Untyped listing for display-only resource types.
    pub fn list_raw(&self, resource_type: ResourceType) -> Result<Vec<Value>> {
        self.list_as(resource_type)
    }

    fn list_as<T: DeserializeOwned>(&self, resource_type: ResourceType) -> Result<Vec<T>> {
        let path = format!("/clip/v2/resource/{}", resource_type.path());
        let envelope: Envelope<T> = self.request(Method::GET, &path, Option::<&()>::None)?;
        Ok(envelope.data)
    }

    pub fn create_scene(&self, scene: &NewScene) -> Result<String> {
        let mut body = serde_json::json!({
            "type": "scene",
            "metadata": { "name": scene.name },
            "group": scene.group,
            "actions": scene.actions,
            "auto_dynamic": scene.auto_dynamic,
            "speed": scene.speed,
        });
        if let Some(palette) = &scene.palette
            && let Some(map) = body.as_object_mut()
        {
            map.insert("palette".into(), palette.clone());
        }

        let envelope: Envelope<Value> =
            self.request(Method::POST, "/clip/v2/resource/scene", Some(&body))?;
        envelope
            .data
            .first()
            .and_then(|entry| entry.get("rid"))
            .and_then(|rid| rid.as_str())
            .map(|rid| rid.to_string())
            .ok_or_else(|| anyhow!("create response carried no scene rid"))
    }

    pub fn delete_scene(&self, scene_id: &str) -> Result<()> {
        let path = format!("/clip/v2/resource/scene/{scene_id}");
        let _: Envelope<Value> = self.request(Method::DELETE, &path, Option::<&()>::None)?;
        Ok(())
    }

    fn request<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>> {
        let normalized = path.trim_start_matches('/');
        let url = self
            .base_url
            .join(normalized)
            .with_context(|| format!("joining path `{}` to bridge URL", path))?;

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .context("sending request to bridge")?;

        let envelope: Envelope<T> = response.json().context("parsing bridge response")?;
        if let Some(err) = envelope.errors.first() {
            return Err(anyhow!("bridge error: {}", err.description));
        }
        Ok(envelope)
    }
}

impl SceneWriter for BridgeClient {
    fn create_scene(&self, scene: &NewScene) -> Result<String> {
        BridgeClient::create_scene(self, scene)
    }

    fn delete_scene(&self, scene_id: &str) -> Result<()> {
        BridgeClient::delete_scene(self, scene_id)
    }
}
