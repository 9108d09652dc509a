use crate::error::AssetError;
use crate::identity::{AssetId, AssetIdentity};
use crate::object::AssetObject;

/// Sink an importer writes the objects of one source file into.
pub trait ImportContext {
    /// Asset id of the file being imported.
    fn asset_id(&self) -> AssetId;

    /// Append a sub-object and return the identity it will be registered
    /// under.
    fn add_sub_object(&mut self, object: AssetObject) -> Result<AssetIdentity, AssetError>;

    /// Set the file's main object, replacing any previous one.
    fn set_main_object(&mut self, object: AssetObject) -> AssetIdentity;
}

/// The objects produced by importing one file: a main object (file id 0) and
/// ordered sub-objects (file ids 1, 2, ...).
#[derive(Debug, Clone)]
pub struct SerializedAsset {
    asset_id: AssetId,
    main: Option<AssetObject>,
    sub_objects: Vec<AssetObject>,
}

impl SerializedAsset {
    pub fn new(asset_id: AssetId) -> Self {
        Self {
            asset_id,
            main: None,
            sub_objects: Vec::new(),
        }
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn main_object(&self) -> Option<&AssetObject> {
        self.main.as_ref()
    }

    pub fn sub_objects(&self) -> &[AssetObject] {
        &self.sub_objects
    }

    /// Object stored under `file_id`.
    pub fn object(&self, file_id: i16) -> Option<&AssetObject> {
        match file_id {
            AssetIdentity::MAIN_FILE_ID => self.main.as_ref(),
            id if id > 0 => self.sub_objects.get(id as usize - 1),
            _ => None,
        }
    }

    /// Every object with its identity, main object first.
    pub fn objects(&self) -> impl Iterator<Item = (AssetIdentity, &AssetObject)> {
        let asset_id = self.asset_id;
        self.main
            .iter()
            .map(move |main| (AssetIdentity::main(asset_id), main))
            .chain(
                self.sub_objects
                    .iter()
                    .enumerate()
                    .map(move |(i, object)| (AssetIdentity::new(asset_id, i as i16 + 1), object)),
            )
    }
}

impl ImportContext for SerializedAsset {
    fn asset_id(&self) -> AssetId {
        SerializedAsset::asset_id(self)
    }

    fn add_sub_object(&mut self, object: AssetObject) -> Result<AssetIdentity, AssetError> {
        let file_id = i16::try_from(self.sub_objects.len() + 1)
            .map_err(|_| AssetError::TooManySubObjects(self.asset_id))?;
        self.sub_objects.push(object);
        Ok(AssetIdentity::new(self.asset_id, file_id))
    }

    fn set_main_object(&mut self, object: AssetObject) -> AssetIdentity {
        self.main = Some(object);
        AssetIdentity::main(self.asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture2D;

    #[test]
    fn sub_objects_get_sequential_file_ids() {
        let asset_id = AssetId::new();
        let mut asset = SerializedAsset::new(asset_id);
        let a = asset.add_sub_object(Texture2D::solid("a", 1, 1, [0; 4]).into()).unwrap();
        let b = asset.add_sub_object(Texture2D::solid("b", 1, 1, [0; 4]).into()).unwrap();
        let main = asset.set_main_object(Texture2D::solid("main", 1, 1, [0; 4]).into());

        assert_eq!(a, AssetIdentity::new(asset_id, 1));
        assert_eq!(b, AssetIdentity::new(asset_id, 2));
        assert_eq!(main, AssetIdentity::main(asset_id));
        assert_eq!(asset.object(2).map(AssetObject::name), Some("b"));
        assert_eq!(asset.object(0).map(AssetObject::name), Some("main"));
        assert!(asset.object(3).is_none());
        assert!(asset.object(-1).is_none());

        let names: Vec<_> = asset.objects().map(|(_, o)| o.name()).collect();
        assert_eq!(names, ["main", "a", "b"]);
    }
}
