//! Immutable rules catalog: per-key unit, building and weapon data.
//!
//! The catalog is consumed, never produced, by the simulation. String keys
//! are the stable external form (actions, JSON data files); at load they are
//! interned into small integer keys ([`UnitKey`], [`BuildingKey`],
//! [`WeaponKey`]) that entities and systems carry.
//!
//! [`RulesCatalog::standard`] is the authoritative built-in data set;
//! [`RulesCatalog::from_json`] lets embedders swap the data without
//! recompiling.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interned unit key (index into the unit table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey(pub u16);

/// Interned building key (index into the building table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingKey(pub u16);

/// Interned weapon key (index into the weapon table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponKey(pub u16);

/// Production lane a unit or building is queued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionCategory {
    Building,
    Infantry,
    Vehicle,
    Air,
}

impl ProductionCategory {
    pub const ALL: [ProductionCategory; 4] = [
        ProductionCategory::Building,
        ProductionCategory::Infantry,
        ProductionCategory::Vehicle,
        ProductionCategory::Air,
    ];

    pub fn index(self) -> usize {
        match self {
            ProductionCategory::Building => 0,
            ProductionCategory::Infantry => 1,
            ProductionCategory::Vehicle => 2,
            ProductionCategory::Air => 3,
        }
    }
}

/// Armor class of a target; selects the damage-modifier row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorClass {
    None,
    Light,
    Heavy,
    Structure,
    Air,
}

impl ArmorClass {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            ArmorClass::None => 0,
            ArmorClass::Light => 1,
            ArmorClass::Heavy => 2,
            ArmorClass::Structure => 3,
            ArmorClass::Air => 4,
        }
    }
}

/// Weapon class; selects the damage-modifier column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    Bullet,
    Flak,
    Rocket,
    Shell,
    Missile,
    Heal,
    Demolition,
}

impl WeaponClass {
    pub const COUNT: usize = 7;

    pub fn index(self) -> usize {
        match self {
            WeaponClass::Bullet => 0,
            WeaponClass::Flak => 1,
            WeaponClass::Rocket => 2,
            WeaponClass::Shell => 3,
            WeaponClass::Missile => 4,
            WeaponClass::Heal => 5,
            WeaponClass::Demolition => 6,
        }
    }
}

/// Trajectory/behavior shape of an emitted projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponArchetype {
    /// Straight line, instant-feel bullet. Never interceptable.
    Hitscan,
    Rocket,
    Artillery,
    Missile,
    Ballistic,
    Grenade,
}

impl WeaponArchetype {
    /// Visual arc height factor (fraction of travel distance).
    pub fn arc_factor(self) -> f32 {
        match self {
            WeaponArchetype::Artillery => 0.35,
            WeaponArchetype::Ballistic => 0.12,
            WeaponArchetype::Grenade => 0.25,
            _ => 0.0,
        }
    }
}

/// What a unit does beyond (or instead of) shooting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitSpecial {
    #[default]
    None,
    Harvester,
    Engineer,
    Hijacker,
    DemoTruck,
    Mcv,
    Rig,
}

/// Weapon data record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub key: String,
    pub class: WeaponClass,
    pub archetype: WeaponArchetype,
    /// Base damage per shot. Negative heals.
    pub damage: i32,
    pub range: f32,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Projectile travel speed (world units per tick).
    pub speed: f32,
    /// Splash radius; 0 = point damage.
    #[serde(default)]
    pub splash: f32,
    /// Starting hp of the projectile; > 0 means interceptable in flight.
    #[serde(default)]
    pub projectile_hp: i32,
    /// Can this weapon engage flying targets?
    #[serde(default)]
    pub targets_air: bool,
    /// Can this weapon engage ground targets?
    #[serde(default = "default_true")]
    pub targets_ground: bool,
    /// Can this weapon shoot down interceptable projectiles (SAM behavior)?
    #[serde(default)]
    pub targets_projectiles: bool,
}

fn default_true() -> bool {
    true
}

/// Unit data record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    pub key: String,
    pub name: String,
    pub cost: u32,
    /// Normalized build time in ticks at full speed and power.
    pub build_ticks: u32,
    pub hp: i32,
    pub speed: f32,
    pub armor: ArmorClass,
    pub radius: f32,
    pub category: ProductionCategory,
    #[serde(default)]
    pub weapon: Option<String>,
    /// Building keys that must exist before this unit can be queued.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub special: UnitSpecial,
    #[serde(default)]
    pub is_air: bool,
    /// Air-unit sortie ammo.
    #[serde(default)]
    pub ammo: u32,
    /// Harvester cargo capacity (credits).
    #[serde(default)]
    pub cargo_capacity: u32,
    /// Ore hp extracted per harvest hit.
    #[serde(default)]
    pub harvest_rate: i32,
    /// Ticks between harvest hits.
    #[serde(default)]
    pub harvest_cooldown: u32,
    /// Kiting-capable units keep their move target while firing.
    #[serde(default)]
    pub attack_while_moving: bool,
    /// Demo truck blast damage at ground zero.
    #[serde(default)]
    pub demolition_damage: i32,
    /// Demo truck blast radius.
    #[serde(default)]
    pub demolition_radius: f32,
    /// Building this unit converts into on DEPLOY (MCV, rig).
    #[serde(default)]
    pub deploys_into: Option<String>,
}

impl UnitSpec {
    pub fn is_combat(&self) -> bool {
        self.weapon.is_some() && self.special == UnitSpecial::None
    }
}

/// Building data record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub key: String,
    pub name: String,
    pub cost: u32,
    pub build_ticks: u32,
    pub hp: i32,
    pub w: f32,
    pub h: f32,
    /// Positive generates power, negative drains it.
    pub power: i32,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Production lane this building unlocks and spawns from.
    #[serde(default)]
    pub produces: Option<ProductionCategory>,
    #[serde(default)]
    pub is_conyard: bool,
    #[serde(default)]
    pub is_refinery: bool,
    #[serde(default)]
    pub is_depot: bool,
    #[serde(default)]
    pub is_extractor: bool,
    /// Air-base docking slots; 0 for everything else.
    #[serde(default)]
    pub air_slots: u32,
    /// Defense buildings are placed near power and never count for build radius.
    #[serde(default)]
    pub is_defense: bool,
    /// Not directly buildable (conversion results such as the extractor).
    #[serde(default)]
    pub unbuildable: bool,
}

impl BuildingSpec {
    pub fn radius(&self) -> f32 {
        0.5 * self.w.max(self.h)
    }

    pub fn armor(&self) -> ArmorClass {
        ArmorClass::Structure
    }
}

/// Well behavior parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellRules {
    pub ore_spawn_radius: f32,
    /// Ore hp healed per well tick on one nearby deposit.
    pub ore_growth_rate: i32,
    pub max_ore_per_well: usize,
    pub max_ore_amount: i32,
    pub spawn_rate_ticks_min: u64,
    pub spawn_rate_ticks_max: u64,
    pub initial_ore_amount: i32,
}

/// Economy-wide tuning values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyRules {
    pub start_credits: u32,
    /// Fraction of build cost charged for a full repair.
    pub repair_cost_percentage: f32,
    /// Ticks for a full repair from zero.
    pub repair_duration_ticks: u32,
    /// Fraction of cost returned when selling at full hp.
    pub sell_return_percentage: f32,
    /// Hard cap on queued items per lane.
    pub max_queue: usize,
    /// Build-speed factor under power deficit.
    pub low_power_factor: f32,
    /// Speed bonus per extra production building of the same lane.
    pub extra_production_speedup: f32,
    /// Maximum distance from a non-defense building for placement.
    pub build_radius: f32,
    /// Credits an extractor trickles per interval.
    pub extractor_trickle: u32,
    pub extractor_interval: u64,
}

/// The complete immutable catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesCatalog {
    pub units: Vec<UnitSpec>,
    pub buildings: Vec<BuildingSpec>,
    pub weapons: Vec<WeaponSpec>,
    /// Row-major `[weapon_class][armor_class]` multiplier table.
    pub damage_modifiers: Vec<Vec<f32>>,
    pub well: WellRules,
    pub economy: EconomyRules,
    #[serde(skip)]
    unit_index: HashMap<String, UnitKey>,
    #[serde(skip)]
    building_index: HashMap<String, BuildingKey>,
    #[serde(skip)]
    weapon_index: HashMap<String, WeaponKey>,
}

/// Resource wrapper so systems can `Res<RulesRes>`.
#[derive(Resource, Clone)]
pub struct RulesRes(pub std::sync::Arc<RulesCatalog>);

impl std::ops::Deref for RulesRes {
    type Target = RulesCatalog;
    fn deref(&self) -> &RulesCatalog {
        &self.0
    }
}

impl RulesCatalog {
    /// Load a catalog from its JSON form and rebuild the interning indices.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut catalog: RulesCatalog = serde_json::from_str(json)?;
        catalog.reindex();
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn reindex(&mut self) {
        self.unit_index = self
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.key.clone(), UnitKey(i as u16)))
            .collect();
        self.building_index = self
            .buildings
            .iter()
            .enumerate()
            .map(|(i, b)| (b.key.clone(), BuildingKey(i as u16)))
            .collect();
        self.weapon_index = self
            .weapons
            .iter()
            .enumerate()
            .map(|(i, w)| (w.key.clone(), WeaponKey(i as u16)))
            .collect();
    }

    pub fn unit_key(&self, key: &str) -> Option<UnitKey> {
        self.unit_index.get(key).copied()
    }

    pub fn building_key(&self, key: &str) -> Option<BuildingKey> {
        self.building_index.get(key).copied()
    }

    pub fn weapon_key(&self, key: &str) -> Option<WeaponKey> {
        self.weapon_index.get(key).copied()
    }

    pub fn unit(&self, key: UnitKey) -> &UnitSpec {
        &self.units[key.0 as usize]
    }

    pub fn building(&self, key: BuildingKey) -> &BuildingSpec {
        &self.buildings[key.0 as usize]
    }

    pub fn weapon(&self, key: WeaponKey) -> &WeaponSpec {
        &self.weapons[key.0 as usize]
    }

    pub fn unit_weapon(&self, key: UnitKey) -> Option<&WeaponSpec> {
        self.unit(key)
            .weapon
            .as_deref()
            .and_then(|w| self.weapon_key(w))
            .map(|w| self.weapon(w))
    }

    pub fn building_weapon(&self, key: BuildingKey) -> Option<&WeaponSpec> {
        self.building(key)
            .weapon
            .as_deref()
            .and_then(|w| self.weapon_key(w))
            .map(|w| self.weapon(w))
    }

    /// Damage multiplier for a weapon class against an armor class.
    pub fn damage_modifier(&self, class: WeaponClass, armor: ArmorClass) -> f32 {
        self.damage_modifiers[class.index()][armor.index()]
    }

    /// Keys of the buildings that produce the given lane.
    pub fn production_buildings(&self, category: ProductionCategory) -> Vec<BuildingKey> {
        self.buildings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.produces == Some(category))
            .map(|(i, _)| BuildingKey(i as u16))
            .collect()
    }

    /// Splash falloff: full damage at center, linear to zero at the rim.
    pub fn splash_falloff(distance: f32, splash: f32) -> f32 {
        if splash <= 0.0 {
            1.0
        } else {
            (1.0 - distance / splash).clamp(0.0, 1.0)
        }
    }

    /// The standard data set.
    pub fn standard() -> Self {
        let weapons = vec![
            weapon("rifle", WeaponClass::Bullet, WeaponArchetype::Hitscan, 8, 220.0, 15, 14.0),
            weapon("machine_gun", WeaponClass::Bullet, WeaponArchetype::Hitscan, 12, 240.0, 10, 14.0),
            weapon("harvester_gun", WeaponClass::Bullet, WeaponArchetype::Hitscan, 10, 200.0, 20, 14.0),
            WeaponSpec {
                splash: 40.0,
                ..weapon("frag_grenade", WeaponClass::Bullet, WeaponArchetype::Grenade, 50, 180.0, 55, 6.0)
            },
            WeaponSpec {
                projectile_hp: 10,
                targets_air: true,
                ..weapon("rocket_launcher", WeaponClass::Rocket, WeaponArchetype::Rocket, 45, 320.0, 45, 7.0)
            },
            weapon("tank_75mm", WeaponClass::Shell, WeaponArchetype::Ballistic, 60, 380.0, 50, 9.0),
            weapon("tank_105mm", WeaponClass::Shell, WeaponArchetype::Ballistic, 90, 550.0, 65, 9.0),
            WeaponSpec {
                splash: 60.0,
                projectile_hp: 5,
                ..weapon("howitzer", WeaponClass::Shell, WeaponArchetype::Artillery, 120, 600.0, 90, 5.0)
            },
            WeaponSpec {
                targets_air: true,
                targets_ground: false,
                targets_projectiles: true,
                ..weapon("sam_missile", WeaponClass::Missile, WeaponArchetype::Missile, 80, 450.0, 40, 10.0)
            },
            WeaponSpec {
                targets_air: true,
                targets_ground: false,
                ..weapon("flak_cannon", WeaponClass::Flak, WeaponArchetype::Hitscan, 25, 350.0, 20, 14.0)
            },
            WeaponSpec {
                projectile_hp: 15,
                splash: 30.0,
                ..weapon("maverick", WeaponClass::Missile, WeaponArchetype::Missile, 110, 300.0, 30, 8.0)
            },
            weapon("turret_gun", WeaponClass::Shell, WeaponArchetype::Ballistic, 55, 400.0, 40, 10.0),
            weapon("medkit", WeaponClass::Heal, WeaponArchetype::Hitscan, -8, 120.0, 30, 14.0),
        ];

        let units = vec![
            UnitSpec {
                special: UnitSpecial::Mcv,
                deploys_into: Some("construction_yard".into()),
                ..unit("mcv", "Mobile Construction Vehicle", 2000, 300, 600, 1.4, ArmorClass::Heavy, 22.0, ProductionCategory::Vehicle, None)
            },
            UnitSpec {
                special: UnitSpecial::Harvester,
                cargo_capacity: 500,
                harvest_rate: 50,
                harvest_cooldown: 4,
                weapon: Some("harvester_gun".into()),
                ..unit("harvester", "Ore Harvester", 1100, 180, 700, 2.5, ArmorClass::Light, 20.0, ProductionCategory::Vehicle, None)
            },
            unit("rifleman", "Rifleman", 120, 40, 120, 1.8, ArmorClass::None, 8.0, ProductionCategory::Infantry, Some("rifle")),
            unit("grenadier", "Grenadier", 250, 60, 130, 1.7, ArmorClass::None, 8.0, ProductionCategory::Infantry, Some("frag_grenade")),
            unit("rocket_trooper", "Rocket Trooper", 300, 70, 110, 1.6, ArmorClass::None, 8.0, ProductionCategory::Infantry, Some("rocket_launcher")),
            UnitSpec {
                special: UnitSpecial::Engineer,
                ..unit("engineer", "Engineer", 500, 80, 100, 1.6, ArmorClass::None, 8.0, ProductionCategory::Infantry, None)
            },
            unit("medic", "Field Medic", 350, 70, 110, 1.8, ArmorClass::None, 8.0, ProductionCategory::Infantry, Some("medkit")),
            UnitSpec {
                special: UnitSpecial::Hijacker,
                prerequisites: vec!["tech_center".into()],
                ..unit("hijacker", "Hijacker", 600, 90, 100, 2.2, ArmorClass::None, 8.0, ProductionCategory::Infantry, None)
            },
            UnitSpec {
                attack_while_moving: true,
                ..unit("recon_buggy", "Recon Buggy", 500, 90, 250, 4.2, ArmorClass::Light, 14.0, ProductionCategory::Vehicle, Some("machine_gun"))
            },
            unit("light_tank", "Light Tank", 900, 140, 450, 2.8, ArmorClass::Heavy, 18.0, ProductionCategory::Vehicle, Some("tank_75mm")),
            UnitSpec {
                prerequisites: vec!["tech_center".into()],
                ..unit("heavy_tank", "Heavy Tank", 1450, 220, 750, 2.0, ArmorClass::Heavy, 22.0, ProductionCategory::Vehicle, Some("tank_105mm"))
            },
            UnitSpec {
                prerequisites: vec!["tech_center".into()],
                ..unit("artillery", "Mobile Artillery", 1200, 200, 280, 1.8, ArmorClass::Light, 18.0, ProductionCategory::Vehicle, Some("howitzer"))
            },
            UnitSpec {
                attack_while_moving: true,
                ..unit("flak_track", "Flak Track", 700, 110, 350, 3.4, ArmorClass::Light, 16.0, ProductionCategory::Vehicle, Some("flak_cannon"))
            },
            UnitSpec {
                special: UnitSpecial::DemoTruck,
                demolition_damage: 900,
                demolition_radius: 180.0,
                prerequisites: vec!["tech_center".into()],
                ..unit("demo_truck", "Demolition Truck", 1500, 180, 300, 2.6, ArmorClass::Light, 18.0, ProductionCategory::Vehicle, None)
            },
            UnitSpec {
                special: UnitSpecial::Rig,
                deploys_into: Some("induction_extractor".into()),
                ..unit("induction_rig", "Induction Rig", 800, 150, 400, 1.6, ArmorClass::Light, 20.0, ProductionCategory::Vehicle, None)
            },
            UnitSpec {
                is_air: true,
                ammo: 2,
                attack_while_moving: true,
                ..unit("harrier", "Harrier", 1200, 200, 240, 6.0, ArmorClass::Air, 16.0, ProductionCategory::Air, Some("maverick"))
            },
        ];

        let buildings = vec![
            BuildingSpec {
                is_conyard: true,
                produces: Some(ProductionCategory::Building),
                ..building("construction_yard", "Construction Yard", 2500, 300, 1500, 96.0, 96.0, 0)
            },
            building("power_plant", "Power Plant", 300, 60, 600, 64.0, 64.0, 100),
            BuildingSpec {
                is_refinery: true,
                prerequisites: vec!["power_plant".into()],
                ..building("ore_refinery", "Ore Refinery", 1500, 180, 900, 96.0, 80.0, -30)
            },
            BuildingSpec {
                produces: Some(ProductionCategory::Infantry),
                prerequisites: vec!["power_plant".into()],
                ..building("barracks", "Barracks", 400, 80, 700, 64.0, 64.0, -20)
            },
            BuildingSpec {
                produces: Some(ProductionCategory::Vehicle),
                prerequisites: vec!["ore_refinery".into()],
                ..building("war_factory", "War Factory", 1800, 200, 1000, 96.0, 80.0, -30)
            },
            BuildingSpec {
                produces: Some(ProductionCategory::Air),
                air_slots: 6,
                prerequisites: vec!["war_factory".into()],
                ..building("air_base", "Air Base", 1000, 160, 800, 96.0, 96.0, -40)
            },
            BuildingSpec {
                is_defense: true,
                weapon: Some("turret_gun".into()),
                prerequisites: vec!["barracks".into()],
                ..building("guard_turret", "Guard Turret", 600, 100, 500, 40.0, 40.0, -10)
            },
            BuildingSpec {
                is_defense: true,
                weapon: Some("sam_missile".into()),
                prerequisites: vec!["barracks".into()],
                ..building("sam_site", "SAM Site", 750, 110, 450, 48.0, 48.0, -20)
            },
            BuildingSpec {
                is_depot: true,
                prerequisites: vec!["war_factory".into()],
                ..building("service_depot", "Service Depot", 1200, 150, 800, 96.0, 80.0, -25)
            },
            BuildingSpec {
                prerequisites: vec!["war_factory".into()],
                ..building("tech_center", "Tech Center", 2000, 220, 600, 64.0, 64.0, -50)
            },
            BuildingSpec {
                is_extractor: true,
                unbuildable: true,
                ..building("induction_extractor", "Induction Extractor", 800, 1, 600, 64.0, 64.0, 0)
            },
        ];

        // [weapon_class][armor_class]: none, light, heavy, structure, air
        let damage_modifiers = vec![
            vec![1.0, 0.75, 0.3, 0.25, 0.6],  // bullet
            vec![0.8, 0.8, 0.4, 0.3, 1.5],    // flak
            vec![0.5, 0.9, 1.0, 1.0, 0.9],    // rocket
            vec![0.4, 0.75, 1.0, 1.2, 0.0],   // shell
            vec![0.7, 0.9, 0.9, 1.0, 1.3],    // missile
            vec![1.0, 1.0, 1.0, 1.0, 1.0],    // heal
            vec![1.0, 1.0, 0.9, 1.3, 0.5],    // demolition
        ];

        let mut catalog = RulesCatalog {
            units,
            buildings,
            weapons,
            damage_modifiers,
            well: WellRules {
                ore_spawn_radius: 150.0,
                ore_growth_rate: 5,
                max_ore_per_well: 8,
                max_ore_amount: 600,
                spawn_rate_ticks_min: 120,
                spawn_rate_ticks_max: 240,
                initial_ore_amount: 150,
            },
            economy: EconomyRules {
                start_credits: 5000,
                repair_cost_percentage: 0.25,
                repair_duration_ticks: 150,
                sell_return_percentage: 0.5,
                max_queue: 99,
                low_power_factor: 0.25,
                extra_production_speedup: 0.5,
                build_radius: 250.0,
                extractor_trickle: 15,
                extractor_interval: 30,
            },
            unit_index: HashMap::new(),
            building_index: HashMap::new(),
            weapon_index: HashMap::new(),
        };
        catalog.reindex();
        catalog
    }
}

fn weapon(
    key: &str,
    class: WeaponClass,
    archetype: WeaponArchetype,
    damage: i32,
    range: f32,
    cooldown: u32,
    speed: f32,
) -> WeaponSpec {
    WeaponSpec {
        key: key.into(),
        class,
        archetype,
        damage,
        range,
        cooldown,
        speed,
        splash: 0.0,
        projectile_hp: 0,
        targets_air: false,
        targets_ground: true,
        targets_projectiles: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn unit(
    key: &str,
    name: &str,
    cost: u32,
    build_ticks: u32,
    hp: i32,
    speed: f32,
    armor: ArmorClass,
    radius: f32,
    category: ProductionCategory,
    weapon: Option<&str>,
) -> UnitSpec {
    UnitSpec {
        key: key.into(),
        name: name.into(),
        cost,
        build_ticks,
        hp,
        speed,
        armor,
        radius,
        category,
        weapon: weapon.map(Into::into),
        prerequisites: Vec::new(),
        special: UnitSpecial::None,
        is_air: false,
        ammo: 0,
        cargo_capacity: 0,
        harvest_rate: 0,
        harvest_cooldown: 0,
        attack_while_moving: false,
        demolition_damage: 0,
        demolition_radius: 0.0,
        deploys_into: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn building(
    key: &str,
    name: &str,
    cost: u32,
    build_ticks: u32,
    hp: i32,
    w: f32,
    h: f32,
    power: i32,
) -> BuildingSpec {
    BuildingSpec {
        key: key.into(),
        name: name.into(),
        cost,
        build_ticks,
        hp,
        w,
        h,
        power,
        weapon: None,
        prerequisites: Vec::new(),
        produces: None,
        is_conyard: false,
        is_refinery: false,
        is_depot: false,
        is_extractor: false,
        air_slots: 0,
        is_defense: false,
        unbuildable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_interning() {
        let rules = RulesCatalog::standard();
        let key = rules.unit_key("harvester").unwrap();
        let spec = rules.unit(key);
        assert_eq!(spec.special, UnitSpecial::Harvester);
        assert_eq!(spec.cargo_capacity, 500);
        assert!(rules.unit_key("no_such_unit").is_none());
    }

    #[test]
    fn test_damage_modifier_table() {
        let rules = RulesCatalog::standard();
        assert!((rules.damage_modifier(WeaponClass::Bullet, ArmorClass::Heavy) - 0.3).abs() < 1e-6);
        // Shells cannot hit air.
        assert_eq!(rules.damage_modifier(WeaponClass::Shell, ArmorClass::Air), 0.0);
        for class_row in &rules.damage_modifiers {
            assert_eq!(class_row.len(), ArmorClass::COUNT);
        }
        assert_eq!(rules.damage_modifiers.len(), WeaponClass::COUNT);
    }

    #[test]
    fn test_production_building_lookup() {
        let rules = RulesCatalog::standard();
        let infantry = rules.production_buildings(ProductionCategory::Infantry);
        assert_eq!(infantry.len(), 1);
        assert_eq!(rules.building(infantry[0]).key, "barracks");
    }

    #[test]
    fn test_splash_falloff_shape() {
        assert_eq!(RulesCatalog::splash_falloff(0.0, 100.0), 1.0);
        assert!((RulesCatalog::splash_falloff(50.0, 100.0) - 0.5).abs() < 1e-6);
        assert_eq!(RulesCatalog::splash_falloff(150.0, 100.0), 0.0);
        // No splash means full damage regardless of distance.
        assert_eq!(RulesCatalog::splash_falloff(37.0, 0.0), 1.0);
    }

    #[test]
    fn test_json_round_trip_reindexes() {
        let rules = RulesCatalog::standard();
        let json = rules.to_json().unwrap();
        let back = RulesCatalog::from_json(&json).unwrap();
        assert_eq!(back.unit_key("mcv"), rules.unit_key("mcv"));
        assert_eq!(back.building_key("war_factory"), rules.building_key("war_factory"));
    }

    #[test]
    fn test_every_weapon_reference_resolves() {
        let rules = RulesCatalog::standard();
        for u in &rules.units {
            if let Some(w) = &u.weapon {
                assert!(rules.weapon_key(w).is_some(), "unit {} weapon {}", u.key, w);
            }
            for p in &u.prerequisites {
                assert!(rules.building_key(p).is_some(), "unit {} prereq {}", u.key, p);
            }
            if let Some(d) = &u.deploys_into {
                assert!(rules.building_key(d).is_some(), "unit {} deploy {}", u.key, d);
            }
        }
        for b in &rules.buildings {
            if let Some(w) = &b.weapon {
                assert!(rules.weapon_key(w).is_some(), "building {} weapon {}", b.key, w);
            }
            for p in &b.prerequisites {
                assert!(rules.building_key(p).is_some(), "building {} prereq {}", b.key, p);
            }
        }
    }
}
