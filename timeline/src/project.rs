use crate::asset::Asset;

/**
    The asset table of a timeline, plus the URI it was loaded from.

    Assets keep their registration order so serialized documents are
    stable.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    uri: Option<String>,
    assets: Vec<Asset>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Register an asset, replacing any previous asset with the same id.
    */
    pub fn add_asset(&mut self, asset: Asset) {
        if let Some(existing) = self.assets.iter_mut().find(|a| a.id() == asset.id()) {
            *existing = asset;
        } else {
            self.assets.push(asset);
        }
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id() == id)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// URI of the file this project was loaded from or saved to.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub(crate) fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = Some(uri.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timecode_types::ClockTime;

    #[test]
    fn add_asset_replaces_same_id() {
        let mut project = Project::new();
        project.add_asset(Asset::new("a"));
        project.add_asset(Asset::new("b"));
        project.add_asset(Asset::new("a").with_duration(ClockTime::SECOND));

        assert_eq!(project.assets().len(), 2);
        assert_eq!(project.asset("a").unwrap().duration(), Some(ClockTime::SECOND));
        assert_eq!(project.assets()[0].id(), "a");
        assert_eq!(project.assets()[1].id(), "b");
    }

    #[test]
    fn unknown_asset_is_none() {
        assert!(Project::new().asset("missing").is_none());
    }
}
