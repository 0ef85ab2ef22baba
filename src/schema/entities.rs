//! The pet-care catalogue plus the generic thing/stuff pair.

use super::types::{ColumnDef, ColumnType, EntityDef, FieldPolicy, RelationDef};

const NAME: ColumnType = ColumnType::String(255);
const SHORT: ColumnType = ColumnType::String(255);

const PET_FK: ColumnDef = ColumnDef::new("pet_xid", ColumnType::Integer);
const PERSON_FK: ColumnDef = ColumnDef::new("person_xid", ColumnType::Integer);

const OWNERS: &[RelationDef] = &[
    RelationDef::belongs_to("pet", "pet", "pet_xid"),
    RelationDef::belongs_to("person", "person", "person_xid"),
];

pub static PERSON: EntityDef = EntityDef {
    name: "Person",
    path_segment: "person",
    table_name: "person",
    columns: &[ColumnDef::natural_key("name", NAME)],
    relations: &[
        RelationDef::nested_many("activities", "activities", "person_xid"),
        RelationDef::nested_many("toilet", "toilet", "person_xid"),
    ],
    policy: FieldPolicy::show_ids(),
};

pub static PET: EntityDef = EntityDef {
    name: "Pet",
    path_segment: "pet",
    table_name: "pet",
    columns: &[
        ColumnDef::natural_key("name", NAME),
        ColumnDef::new("animal", SHORT),
        ColumnDef::new("birthday", SHORT),
    ],
    relations: &[
        RelationDef::nested_many("food", "food", "pet_xid"),
        RelationDef::nested_many("watercheck", "watercheck", "pet_xid"),
        RelationDef::nested_many("activities", "activities", "pet_xid"),
        RelationDef::nested_many("toilet", "toilet", "pet_xid"),
    ],
    policy: FieldPolicy::show_ids(),
};

pub static FOOD: EntityDef = EntityDef {
    name: "Food",
    path_segment: "food",
    table_name: "food",
    columns: &[ColumnDef::new("foodtype", SHORT), PET_FK, PERSON_FK],
    relations: OWNERS,
    policy: FieldPolicy::show_ids(),
};

pub static WATERCHECK: EntityDef = EntityDef {
    name: "Watercheck",
    path_segment: "watercheck",
    table_name: "watercheck",
    columns: &[
        ColumnDef::new("act_type", SHORT),
        ColumnDef::new("comment", SHORT),
        PET_FK,
        PERSON_FK,
    ],
    relations: OWNERS,
    policy: FieldPolicy::show_ids(),
};

pub static ACTIVITIES: EntityDef = EntityDef {
    name: "Activities",
    path_segment: "activities",
    table_name: "activities",
    columns: &[
        ColumnDef::new("act_type", SHORT),
        ColumnDef::new("comment", SHORT),
        PET_FK,
        PERSON_FK,
    ],
    relations: OWNERS,
    policy: FieldPolicy::show_ids(),
};

pub static TOILET: EntityDef = EntityDef {
    name: "Toilet",
    path_segment: "toilet",
    table_name: "toilet",
    columns: &[
        ColumnDef::new("pee", ColumnType::Boolean),
        ColumnDef::new("poo", ColumnType::Boolean),
        ColumnDef::new("accident", ColumnType::Boolean),
        PET_FK,
        PERSON_FK,
    ],
    relations: OWNERS,
    policy: FieldPolicy::show_ids(),
};

pub static THING: EntityDef = EntityDef {
    name: "Thing",
    path_segment: "thing",
    table_name: "thing",
    columns: &[
        ColumnDef::natural_key("name", NAME),
        ColumnDef::new("description", ColumnType::Text),
    ],
    relations: &[RelationDef::nested_many("stuff", "stuff", "thing_xid")],
    policy: FieldPolicy::show_ids(),
};

pub static STUFF: EntityDef = EntityDef {
    name: "Stuff",
    path_segment: "stuff",
    table_name: "stuff",
    columns: &[
        ColumnDef::new("stuff", SHORT),
        ColumnDef::new("thing_xid", ColumnType::Integer),
    ],
    relations: &[RelationDef::belongs_to("thing", "thing", "thing_xid")],
    policy: FieldPolicy::show_ids(),
};

/// Every entity served by the API, parents before children.
pub static CATALOGUE: &[&EntityDef] = &[
    &PERSON,
    &PET,
    &FOOD,
    &WATERCHECK,
    &ACTIVITIES,
    &TOILET,
    &THING,
    &STUFF,
];
