// src/catalog.rs
//! Built-in tile designs.

/// Texture paths of one design. Paths are resolved against the asset base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapUrls {
    pub diffuse: Option<String>,
    pub normal: Option<String>,
    pub roughness: Option<String>,
}

impl MapUrls {
    pub fn new(diffuse: &str, normal: &str, roughness: &str) -> Self {
        Self {
            diffuse: Some(diffuse.to_string()),
            normal: Some(normal.to_string()),
            roughness: Some(roughness.to_string()),
        }
    }

    /// Only a color map; normal and roughness stay empty.
    pub fn diffuse_only(diffuse: impl Into<String>) -> Self {
        Self {
            diffuse: Some(diffuse.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDesign {
    pub name: String,
    pub description: String,
    pub maps: MapUrls,
}

impl TileDesign {
    pub fn new(name: &str, description: &str, maps: MapUrls) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            maps,
        }
    }
}

/// Ordered list of designs, looked up by exact name.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    designs: Vec<TileDesign>,
}

impl TileCatalog {
    pub fn new(designs: Vec<TileDesign>) -> Self {
        Self { designs }
    }

    pub fn find(&self, name: &str) -> Option<&TileDesign> {
        self.designs.iter().find(|d| d.name == name)
    }

    pub fn first(&self) -> Option<&TileDesign> {
        self.designs.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDesign> {
        self.designs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.designs.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new(vec![
            TileDesign::new(
                "Onyx Serenity",
                "Luxurious onyx texture with elegant white veining and subtle reflections.",
                MapUrls::new(
                    "assets/Onyx015_1K-JPG_Color.jpg",
                    "assets/Onyx015_1K-JPG_NormalGL.jpg",
                    "assets/Onyx015_1K-JPG_Roughness.jpg",
                ),
            ),
            TileDesign::new(
                "Modern Stone",
                "Polished stone tiles with a contemporary geometric pattern.",
                MapUrls::new(
                    "assets/Tiles078_1K-JPG_Color.jpg",
                    "assets/Tiles078_1K-JPG_NormalGL.jpg",
                    "assets/Tiles078_1K-JPG_Roughness.jpg",
                ),
            ),
            TileDesign::new(
                "Travertine Elegance",
                "Classic travertine finish, timeless and warm in tone.",
                MapUrls::new(
                    "assets/Travertine009_1K-JPG_Color.jpg",
                    "assets/Travertine009_1K-JPG_NormalGL.jpg",
                    "assets/Travertine009_1K-JPG_Roughness.jpg",
                ),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_order() {
        let catalog = TileCatalog::default();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, ["Onyx Serenity", "Modern Stone", "Travertine Elegance"]);
        assert_eq!(catalog.first().map(|d| d.name.as_str()), Some("Onyx Serenity"));
    }

    #[test]
    fn test_find_by_name() {
        let catalog = TileCatalog::default();
        let stone = catalog.find("Modern Stone").unwrap();
        assert_eq!(stone.maps.diffuse.as_deref(), Some("assets/Tiles078_1K-JPG_Color.jpg"));
        assert!(catalog.find("modern stone").is_none());
    }

    #[test]
    fn test_diffuse_only() {
        let urls = MapUrls::diffuse_only("custom.png");
        assert_eq!(urls.diffuse.as_deref(), Some("custom.png"));
        assert!(urls.normal.is_none() && urls.roughness.is_none());
    }
}
