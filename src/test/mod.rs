//! Shared fixtures for unit tests.

use crate::reflection::{
    Data, FieldKind, Instance, ObjectDirectory, ObjectId, ReflectedType, ReflectionRegistry,
    StructData, TypeFlags,
};

pub const HERO_CLASS: &str = "/Script/Game.Hero";
pub const STATS_STRUCT: &str = "/Script/Game.Stats";
pub const ITEM_CLASS: &str = "/Script/Game.Item";

fn stats_kind() -> FieldKind {
    FieldKind::Struct {
        struct_path: STATS_STRUCT.into(),
    }
}

fn stats(health: f32, mana: f32) -> Data {
    Data::Struct(StructData {
        type_path: STATS_STRUCT.into(),
        fields: vec![Data::Float(health), Data::Float(mana)],
    })
}

// Registry with an engine base class, a small item hierarchy, one struct, one enum and the
// Hero class carrying one field of every interesting kind
pub fn fixture_registry() -> ReflectionRegistry {
    let registry = ReflectionRegistry::new();

    registry.register(ReflectedType::class("/Script/Engine", "Actor"));
    registry.register(ReflectedType::class("/Script/Engine", "World"));
    registry.register(ReflectedType::class("/Script/Game", "Item").with_parent("/Script/Engine.Actor"));
    registry.register(ReflectedType::class("/Script/Game", "Weapon").with_parent(ITEM_CLASS));
    registry.register(ReflectedType::interface("/Script/Game", "Usable"));
    registry.register(
        ReflectedType::enumeration("/Script/Game", "EMood")
            .with_entry("Calm", 0)
            .with_entry("Happy", 1)
            .with_entry("Angry", 2),
    );
    registry.register(
        ReflectedType::structure("/Script/Game", "Stats")
            .with_field("Health", FieldKind::Float)
            .with_field("Mana", FieldKind::Float),
    );
    registry.register(
        ReflectedType::class("/Script/Game", "Hero")
            .with_parent("/Script/Engine.Actor")
            .with_flags(TypeFlags::USER_ASSET)
            .with_field("Health", FieldKind::Float)
            .with_field("Alive", FieldKind::Bool)
            .with_field("Level", FieldKind::Int64)
            .with_field("Ratio", FieldKind::Double)
            .with_field("Nick", FieldKind::Str)
            .with_field("Title", FieldKind::Text)
            .with_field(
                "Mood",
                FieldKind::Enum {
                    enum_path: "/Script/Game.EMood".into(),
                    byte_backed: true,
                },
            )
            .with_field("Stats", stats_kind())
            .with_field("Scores", FieldKind::array_of(FieldKind::Int32))
            .with_field("Party", FieldKind::array_of(stats_kind()))
            .with_field("Loadout", FieldKind::map_of(FieldKind::Name, FieldKind::Int32))
            .with_field("Levels", FieldKind::map_of(FieldKind::Int32, FieldKind::Str))
            .with_field("Tags", FieldKind::set_of(FieldKind::Name))
            .with_field(
                "Target",
                FieldKind::Object {
                    class_path: ITEM_CLASS.into(),
                },
            )
            .with_field(
                "LazyTarget",
                FieldKind::SoftObject {
                    class_path: ITEM_CLASS.into(),
                },
            )
            .with_field(
                "OnHit",
                FieldKind::Delegate {
                    signature: "OnHitSignature".into(),
                },
            ),
    );

    registry
}

// Hero instance whose data follows the Hero layout
pub fn fixture_hero() -> Instance {
    Instance {
        class_path: HERO_CLASS.into(),
        fields: vec![
            Data::Float(100.0),
            Data::Bool(true),
            Data::Int64(12),
            Data::Double(0.25),
            Data::Str("Rook".into()),
            Data::Text("The Brave".into()),
            Data::Enum(1),
            stats(75.0, 50.0),
            Data::Array(vec![Data::Int32(10), Data::Int32(20), Data::Int32(30)]),
            Data::Array(vec![stats(10.0, 5.0)]),
            Data::Map(vec![
                (Data::Name("main.hand".into()), Data::Int32(7)),
                (Data::Name("offhand".into()), Data::Int32(3)),
            ]),
            Data::Map(vec![
                (Data::Int32(1), Data::Str("Town".into())),
                (Data::Int32(2), Data::Str("Forest".into())),
            ]),
            Data::Set(vec![Data::Name("hero".into())]),
            Data::Object(None),
            Data::SoftPath(None),
            Data::Delegate(None),
        ],
    }
}

pub fn fixture_world() -> (ReflectionRegistry, Instance) {
    (fixture_registry(), fixture_hero())
}

// Directory with a loaded-on-demand sword, an unloaded shield and an unrelated map object
pub fn fixture_objects() -> (ObjectDirectory, ObjectId, ObjectId) {
    let objects = ObjectDirectory::new();
    let sword = objects
        .insert("/Game/Items/Sword", "Sword", "/Script/Game.Weapon", false)
        .unwrap();
    let shield = objects
        .insert("/Game/Items/Shield", "Shield", ITEM_CLASS, false)
        .unwrap();
    objects
        .insert("/Game/Maps/Arena", "Arena", "/Script/Engine.World", true)
        .unwrap();
    (objects, sword, shield)
}
