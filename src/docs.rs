use utoipa::OpenApi;

use registrar_core::{ErrorResponse, IdentifierKind, ParsedMatricule, RolePrefix};
use registrar_models::{
    Account, AccountWithRoles, CreateAccountDto, CreateEnrollmentDto, Enrollment,
    MatriculeGenerated, RegenerateMatriculeDto, StudentMatriculeDto, SubjectKind,
};

use crate::modules::matricules::model::{
    MatriculeAssignment, MatriculeInfo, PrefixesResponse, ValidateMatriculeDto,
    ValidationResponse, ValidationTarget,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::matricules::controller::get_prefixes,
        crate::modules::matricules::controller::inspect_matricule,
        crate::modules::matricules::controller::validate_matricule,
        crate::modules::users::controller::create_account,
        crate::modules::users::controller::get_account,
        crate::modules::users::controller::regenerate_matricule,
        crate::modules::students::controller::create_enrollment,
        crate::modules::students::controller::get_enrollment,
        crate::modules::students::controller::generate_student_matricule,
        crate::modules::students::controller::regenerate_registration_number,
    ),
    components(
        schemas(
            Account,
            AccountWithRoles,
            CreateAccountDto,
            RegenerateMatriculeDto,
            Enrollment,
            CreateEnrollmentDto,
            StudentMatriculeDto,
            MatriculeInfo,
            MatriculeAssignment,
            MatriculeGenerated,
            SubjectKind,
            IdentifierKind,
            ParsedMatricule,
            RolePrefix,
            PrefixesResponse,
            ValidateMatriculeDto,
            ValidationTarget,
            ValidationResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Matricules", description = "Identifier inspection and validation"),
        (name = "Users", description = "Accounts and their matricules"),
        (name = "Students", description = "Enrollments, registration numbers and student matricules"),
    ),
    info(
        title = "Registrar API",
        version = "0.1.0",
        description = "Matricule and registration number generation for school accounts and enrollments",
    )
)]
pub struct ApiDoc;
