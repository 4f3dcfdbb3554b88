use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use serde::{Deserialize, Serialize};

use super::object::{ObjectId, ObjectKind};
use super::systems::SpawnPlacedObject;
use crate::engine::geo::GeoPoint;

/// A stored object, as persisted by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    #[serde(default)]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: ObjectKind,
    pub location: GeoPoint,
}

impl ObjectDescriptor {
    pub fn to_spawn(&self) -> SpawnPlacedObject {
        SpawnPlacedObject {
            id: self.id,
            kind: self.kind,
            origin: self.location,
            name: self.name.clone(),
        }
    }
}

/// JSON list of stored objects (`*.objects.json`).
#[derive(Asset, TypePath, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedObjectCollection {
    pub objects: Vec<ObjectDescriptor>,
}

impl PlacedObjectCollection {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn spawn_requests(&self) -> impl Iterator<Item = SpawnPlacedObject> + '_ {
        self.objects.iter().map(ObjectDescriptor::to_spawn)
    }
}

#[derive(Resource, Default)]
struct CollectionLoader {
    path: String,
    handle: Option<Handle<PlacedObjectCollection>>,
    loaded: bool,
}

/// Loads a stored-object collection through the asset server and spawns its
/// objects once.
pub struct ObjectCollectionPlugin {
    pub path: String,
}

impl Plugin for ObjectCollectionPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<PlacedObjectCollection>::new(&[
            "objects.json",
        ]))
        .insert_resource(CollectionLoader {
            path: self.path.clone(),
            ..default()
        })
        .add_systems(Update, load_object_collection);
    }
}

fn load_object_collection(
    mut loader: ResMut<CollectionLoader>,
    asset_server: Res<AssetServer>,
    collections: Res<Assets<PlacedObjectCollection>>,
    mut spawns: EventWriter<SpawnPlacedObject>,
) {
    if loader.loaded {
        return;
    }

    let Some(handle) = loader.handle.clone() else {
        println!("Loading object collection from: {}", loader.path);
        loader.handle = Some(asset_server.load(loader.path.clone()));
        return;
    };

    if let Some(collection) = collections.get(&handle) {
        println!(
            "Successfully loaded {} stored objects",
            collection.objects.len()
        );
        spawns.write_batch(collection.spawn_requests());
        loader.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::GeometryKind;

    #[test]
    fn saved_places_asset_parses() {
        let collection = PlacedObjectCollection::from_json_str(include_str!(
            "../../../assets/objects/saved_places.objects.json"
        ))
        .unwrap();

        assert_eq!(collection.objects.len(), 5);
        assert!(
            collection
                .objects
                .iter()
                .all(|o| o.kind.geometry == GeometryKind::Place && o.name.is_some())
        );
        let first = collection.spawn_requests().next().unwrap();
        assert_eq!(first.origin.latitude, 32.782149);
        assert_eq!(first.origin.longitude, -96.805218);
    }

    #[test]
    fn descriptor_defaults_to_box() {
        let collection = PlacedObjectCollection::from_json_str(
            r#"{ "objects": [ { "location": { "latitude": 1.0, "longitude": 2.0 } } ] }"#,
        )
        .unwrap();
        assert_eq!(collection.objects[0].kind, ObjectKind::default());
        assert_eq!(collection.objects[0].id, None);
    }
}
