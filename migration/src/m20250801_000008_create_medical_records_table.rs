use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MedicalRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MedicalRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MedicalRecords::PatientId).uuid().not_null())
                    .col(ColumnDef::new(MedicalRecords::AppointmentId).uuid().null())
                    .col(ColumnDef::new(MedicalRecords::DoctorId).uuid().null())
                    .col(ColumnDef::new(MedicalRecords::RecordDate).date().not_null())
                    .col(ColumnDef::new(MedicalRecords::ChiefComplaint).text().null())
                    .col(ColumnDef::new(MedicalRecords::Diagnosis).text().null())
                    .col(ColumnDef::new(MedicalRecords::Treatment).text().null())
                    .col(ColumnDef::new(MedicalRecords::Prescription).text().null())
                    .col(ColumnDef::new(MedicalRecords::Notes).text().null())
                    .col(
                        ColumnDef::new(MedicalRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MedicalRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medical_records_patient_id")
                            .from(MedicalRecords::Table, MedicalRecords::PatientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medical_records_appointment_id")
                            .from(MedicalRecords::Table, MedicalRecords::AppointmentId)
                            .to(Appointments::Table, Appointments::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_medical_records_doctor_id")
                            .from(MedicalRecords::Table, MedicalRecords::DoctorId)
                            .to(Personnels::Table, Personnels::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_medical_records_patient_id")
                    .table(MedicalRecords::Table)
                    .col(MedicalRecords::PatientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MedicalRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MedicalRecords {
    Table,
    Id,
    PatientId,
    AppointmentId,
    DoctorId,
    RecordDate,
    ChiefComplaint,
    Diagnosis,
    Treatment,
    Prescription,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Personnels {
    Table,
    Id,
}
