use crate::error::McpError;
use crate::executor::LocalTool;
use async_trait::async_trait;
use geochat_llm::Tool;
use serde::Deserialize;
use serde_json::{json, Number, Value};

const MAP_SIZE: &str = "500px";

#[derive(Debug, Default, Deserialize)]
struct CreateMapArgs {
    #[serde(default)]
    lon: Option<Number>,
    #[serde(default)]
    lat: Option<Number>,
    #[serde(default)]
    zoom: Option<Number>,
    #[serde(default)]
    geojson_url: Option<String>,
    #[serde(default)]
    background: Option<String>,
}

/// Builds `<ol-simple-map>` markup the web UI renders as an interactive map
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateMapTool;

impl CreateMapTool {
    pub const NAME: &'static str = "create_map";

    fn render(args: CreateMapArgs) -> String {
        let geojson_url = args.geojson_url.filter(|u| !u.is_empty());
        let background = args
            .background
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "osm".to_string());

        let mut attributes: Vec<String> = Vec::new();
        if let Some(lon) = &args.lon {
            attributes.push(format!("lon=\"{}\"", lon));
        }
        if let Some(lat) = &args.lat {
            attributes.push(format!("lat=\"{}\"", lat));
        }
        if let Some(zoom) = &args.zoom {
            attributes.push(format!("zoom=\"{}\"", zoom));
        }
        attributes.push(format!("width={}", MAP_SIZE));
        attributes.push(format!("height={}", MAP_SIZE));
        attributes.push(format!("background=\"{}\"", background));

        let view_incomplete = args.lon.is_none() || args.lat.is_none() || args.zoom.is_none();
        if let Some(url) = &geojson_url {
            attributes.push(format!("data-url=\"{}\"", url));
            if view_incomplete {
                attributes.push("fit-bounds=\"true\"".to_string());
            }
        }
        attributes.push(format!("background-greyscale={}", geojson_url.is_some()));

        format!("<ol-simple-map {}></ol-simple-map>", attributes.join(" "))
    }
}

#[async_trait]
impl LocalTool for CreateMapTool {
    fn definition(&self) -> Tool {
        Tool::new(
            Self::NAME,
            "Create a map and return it as an HTML string. lon/lat are optional when \
             geojson_url is provided; zoom auto-fits to the data when omitted. background \
             defaults to \"osm\" (\"gpf:GEOGRAPHICALGRIDSYSTEMS.PLANIGNV2\" for IGN France). \
             Important: don't create a map unless the user asks for it.",
            json!({
                "type": "object",
                "properties": {
                    "lon": {"type": "number", "description": "center longitude"},
                    "lat": {"type": "number", "description": "center latitude"},
                    "zoom": {"type": "integer", "description": "zoom level"},
                    "geojson_url": {"type": "string", "description": "URL of a GeoJSON file to overlay"},
                    "background": {"type": "string", "description": "background layer name", "default": "osm"}
                }
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, McpError> {
        let args: CreateMapArgs = match arguments {
            Value::Null => CreateMapArgs::default(),
            other => serde_json::from_value(other).map_err(|e| McpError::InvalidArguments {
                tool: Self::NAME.to_string(),
                message: e.to_string(),
            })?,
        };
        Ok(Self::render(args))
    }
}
