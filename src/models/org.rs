use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Location {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::locations)]
pub struct NewLocation {
    pub name: String,
}

/// A block; `chair_id` is the user designated as its chair, if any.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Block {
    pub id: i32,
    pub name: String,
    pub chair_id: Option<i32>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::blocks)]
pub struct NewBlock {
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Associations, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Block))]
#[diesel(table_name = crate::schema::sections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Section {
    pub id: i32,
    pub name: String,
    pub block_id: i32,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::sections)]
pub struct NewSection {
    pub name: String,
    pub block_id: i32,
}
