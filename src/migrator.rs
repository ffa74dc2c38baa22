use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_events_table::Migration),
            Box::new(m20240101_000002_create_ticket_types_table::Migration),
            Box::new(m20240101_000003_create_attendees_table::Migration),
            Box::new(m20240101_000004_create_tickets_table::Migration),
            Box::new(m20240101_000005_create_check_ins_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_events_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Events::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Events::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Events::Title).string().not_null())
                        .col(ColumnDef::new(Events::DateTime).string().not_null())
                        .col(ColumnDef::new(Events::Venue).string().not_null())
                        .col(ColumnDef::new(Events::Description).text().not_null())
                        .col(
                            ColumnDef::new(Events::Status)
                                .string()
                                .not_null()
                                .default("published"),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Events::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Events {
        Table,
        Id,
        Title,
        DateTime,
        Venue,
        Description,
        Status,
    }
}

mod m20240101_000002_create_ticket_types_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_events_table::Events;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_ticket_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TicketTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TicketTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TicketTypes::EventId).uuid().not_null())
                        .col(ColumnDef::new(TicketTypes::Name).string().not_null())
                        .col(
                            ColumnDef::new(TicketTypes::Price)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(TicketTypes::Limit).integer().not_null())
                        .col(
                            ColumnDef::new(TicketTypes::SoldCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ticket_types_event_id")
                                .from(TicketTypes::Table, TicketTypes::EventId)
                                .to(Events::Table, Events::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ticket_types_event_id")
                        .table(TicketTypes::Table)
                        .col(TicketTypes::EventId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TicketTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum TicketTypes {
        Table,
        Id,
        EventId,
        Name,
        Price,
        Limit,
        SoldCount,
    }
}

mod m20240101_000003_create_attendees_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_attendees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Attendees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Attendees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Attendees::FullName).string().not_null())
                        .col(ColumnDef::new(Attendees::Email).string().not_null())
                        .col(ColumnDef::new(Attendees::Age).integer().not_null())
                        .col(ColumnDef::new(Attendees::Phone).string().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Attendees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Attendees {
        Table,
        Id,
        FullName,
        Email,
        Age,
        Phone,
    }
}

mod m20240101_000004_create_tickets_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_events_table::Events;
    use super::m20240101_000002_create_ticket_types_table::TicketTypes;
    use super::m20240101_000003_create_attendees_table::Attendees;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_tickets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tickets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tickets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Tickets::EventId).uuid().not_null())
                        .col(ColumnDef::new(Tickets::TicketTypeId).uuid().not_null())
                        .col(ColumnDef::new(Tickets::AttendeeId).uuid().not_null())
                        .col(ColumnDef::new(Tickets::Code).string_len(20).null())
                        .col(ColumnDef::new(Tickets::PaymentRef).string_len(100).null())
                        .col(ColumnDef::new(Tickets::QrValue).string_len(255).null())
                        .col(
                            ColumnDef::new(Tickets::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Tickets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tickets_event_id")
                                .from(Tickets::Table, Tickets::EventId)
                                .to(Events::Table, Events::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tickets_ticket_type_id")
                                .from(Tickets::Table, Tickets::TicketTypeId)
                                .to(TicketTypes::Table, TicketTypes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tickets_attendee_id")
                                .from(Tickets::Table, Tickets::AttendeeId)
                                .to(Attendees::Table, Attendees::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Gate lookups resolve by code; codes are globally unique.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tickets_code")
                        .table(Tickets::Table)
                        .col(Tickets::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Batch rows share a payment_ref, so this index is not unique;
            // reference uniqueness across batches comes from generation.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tickets_payment_ref")
                        .table(Tickets::Table)
                        .col(Tickets::PaymentRef)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tickets_event_id")
                        .table(Tickets::Table)
                        .col(Tickets::EventId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tickets_status")
                        .table(Tickets::Table)
                        .col(Tickets::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Tickets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Tickets {
        Table,
        Id,
        EventId,
        TicketTypeId,
        AttendeeId,
        Code,
        PaymentRef,
        QrValue,
        Status,
        CreatedAt,
    }
}

mod m20240101_000005_create_check_ins_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000004_create_tickets_table::Tickets;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_check_ins_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CheckIns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CheckIns::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CheckIns::TicketId).uuid().not_null())
                        .col(ColumnDef::new(CheckIns::CheckedInBy).string().not_null())
                        .col(
                            ColumnDef::new(CheckIns::CheckedInAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_ins_ticket_id")
                                .from(CheckIns::Table, CheckIns::TicketId)
                                .to(Tickets::Table, Tickets::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_ins_ticket_id")
                        .table(CheckIns::Table)
                        .col(CheckIns::TicketId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CheckIns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CheckIns {
        Table,
        Id,
        TicketId,
        CheckedInBy,
        CheckedInAt,
    }
}
