use crate::DbConn;
use crate::{
    config::{JwtConfig, MailConfig, SeedConfig},
    error::{Error, Result, ValidationErrors},
    models::users::{
        CreatePatient, CreateUser, CreatedAccount, LoginResult, LoginUser, NewUser, PublicUser,
        RegisterDentist, RequestContext, Role, User,
    },
    queries::users,
    services::{
        jwt::issue_access_token,
        notifications::{self, Mailer},
    },
    validation::{normalize_email, optional_trimmed, validate_email, validate_name, validate_password},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distr::Alphanumeric};
use secrecy::ExposeSecret;
use uuid::Uuid;

/// Hashes a password with Argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verifies a password against a password hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// `Temp` followed by six hex digits, handed out when no password is chosen.
pub fn temporary_password() -> String {
    format!("Temp{}", hex::encode(rand::random::<[u8; 3]>()))
}

/// Eight random letters and digits, used for password resets.
pub fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

/// Validates and normalizes the shared account fields, returning `(name, email)`.
fn check_identity(name: &str, email: &str) -> Result<(String, String)> {
    let name = validate_name(name)?;
    validate_email(email)?;
    Ok((name, normalize_email(email)))
}

/// Resolves the password to store: the given one after validation, or a
/// generated temporary one (returned as the second element).
fn resolve_password(password: Option<String>) -> Result<(String, Option<String>)> {
    match optional_trimmed(password) {
        Some(password) => {
            validate_password(&password)?;
            Ok((password, None))
        }
        None => {
            let generated = temporary_password();
            Ok((generated.clone(), Some(generated)))
        }
    }
}

/// Public dentist signup
pub async fn register_dentist(conn: &mut DbConn, register: RegisterDentist) -> Result<User> {
    let (name, email) = check_identity(&register.name, &register.email)?;
    validate_password(&register.password)?;

    let new_user = NewUser {
        name,
        email,
        password_hash: hash_password(&register.password)?,
        role: Role::Dentist,
        age: None,
        phone: None,
        photo: None,
        dentist_id: None,
    };

    let user = users::create_user(conn, new_user).await?;
    tracing::info!(user_id = %user.id, "dentist registered");
    Ok(user)
}

/// Creates an account of any role on behalf of an admin
pub async fn create_user(conn: &mut DbConn, create: CreateUser) -> Result<CreatedAccount> {
    let (name, email) = check_identity(&create.name, &create.email)?;
    let (password, temporary_password) = resolve_password(create.password)?;

    let new_user = NewUser {
        name,
        email,
        password_hash: hash_password(&password)?,
        role: create.role,
        age: None,
        phone: None,
        photo: None,
        dentist_id: None,
    };

    let user = users::create_user(conn, new_user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "account created by admin");

    Ok(CreatedAccount {
        user: user.into(),
        temporary_password,
    })
}

/// Field checks of the patient form that need no database. Callers with
/// side effects to undo (a stored photo) run this first.
pub fn check_new_patient(create: &CreatePatient) -> Result<()> {
    check_identity(&create.name, &create.email)?;
    if let Some(password) = optional_trimmed(create.password.clone()) {
        validate_password(&password)?;
    }

    if let Some(age) = create.age {
        if !(0..=150).contains(&age) {
            return Err(Error::Validation(ValidationErrors::single(
                "age",
                "Age must be between 0 and 150",
            )));
        }
    }
    Ok(())
}

/// Creates a patient owned by the calling dentist and emails them that the
/// account exists. Email delivery is best effort.
pub async fn create_patient(
    conn: &mut DbConn,
    mailer: &dyn Mailer,
    mail: &MailConfig,
    ctx: &RequestContext,
    create: CreatePatient,
) -> Result<CreatedAccount> {
    check_new_patient(&create)?;
    let (name, email) = check_identity(&create.name, &create.email)?;
    let (password, temporary_password) = resolve_password(create.password)?;

    let dentist_id = (ctx.role == Role::Dentist).then_some(ctx.user_id);

    let new_user = NewUser {
        name,
        email,
        password_hash: hash_password(&password)?,
        role: Role::Patient,
        age: create.age,
        phone: optional_trimmed(create.phone),
        photo: create.photo,
        dentist_id,
    };

    let user = users::create_user(conn, new_user).await?;
    tracing::info!(patient_id = %user.id, created_by = %ctx.user_id, "patient created");

    notifications::notify(
        mailer,
        notifications::account_created_notice(&user.name, &mail.portal_url, &user.email),
    )
    .await;

    Ok(CreatedAccount {
        user: user.into(),
        temporary_password,
    })
}

/// Checks credentials and issues an access token.
///
/// Unknown emails, wrong passwords and role mismatches all produce the same
/// error so the response does not reveal which accounts exist.
pub async fn login(conn: &mut DbConn, jwt: &JwtConfig, login: LoginUser) -> Result<LoginResult> {
    let invalid = || Error::Authentication("Invalid email or password".to_string());

    let email = normalize_email(&login.email);
    let user = users::get_user_by_email(conn, &email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&login.password, &user.password_hash)? {
        return Err(invalid());
    }

    if let Some(role) = login.role {
        if user.role != role {
            return Err(invalid());
        }
    }

    let (access_token, expires_at) = issue_access_token(
        user.id,
        user.role,
        jwt.secret.expose_secret(),
        jwt.access_token_expiration_minutes,
    )?;

    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

    Ok(LoginResult {
        user: user.into(),
        access_token,
        expires_at,
    })
}

/// Replaces a patient's password with a random one and emails it.
///
/// Always succeeds when the lookup itself works, whether or not the email
/// belongs to a patient.
pub async fn reset_password(conn: &mut DbConn, mailer: &dyn Mailer, email: &str) -> Result<()> {
    let email = normalize_email(email);

    let patient = match users::get_user_by_email(conn, &email).await? {
        Some(user) if user.role == Role::Patient => user,
        _ => {
            tracing::debug!("password reset requested for unknown patient email");
            return Ok(());
        }
    };

    let new_password = random_password();
    users::update_user_password(conn, patient.id, &hash_password(&new_password)?).await?;
    tracing::info!(user_id = %patient.id, "patient password reset");

    notifications::notify(
        mailer,
        notifications::password_reset_notice(&patient.name, &new_password, &patient.email),
    )
    .await;

    Ok(())
}

pub async fn get_profile(conn: &mut DbConn, user_id: Uuid) -> Result<PublicUser> {
    let user = users::get_user_by_id(conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User with ID {} not found", user_id)))?;
    Ok(user.into())
}

pub async fn list_users(conn: &mut DbConn, role: Option<Role>) -> Result<Vec<PublicUser>> {
    let users = users::list_users(conn, role).await?;
    Ok(users.into_iter().map(PublicUser::from).collect())
}

/// Patients visible to a dentist; admins see every patient.
pub async fn list_patients_for_dentist(conn: &mut DbConn, ctx: &RequestContext) -> Result<Vec<PublicUser>> {
    let patients = if ctx.role == Role::Admin {
        users::list_users(conn, Some(Role::Patient)).await?
    } else {
        users::list_patients_for_dentist(conn, ctx.user_id).await?
    };
    Ok(patients.into_iter().map(PublicUser::from).collect())
}

/// Loads a patient the caller may act on.
///
/// Dentists reach the patients they own plus unowned ones; admins reach all.
/// Anything else, including ids of non-patients, is `NotFoundOrForbidden`.
pub async fn get_visible_patient(conn: &mut DbConn, ctx: &RequestContext, patient_id: Uuid) -> Result<User> {
    let not_found = || Error::NotFoundOrForbidden("Patient not found".to_string());

    let patient = users::get_user_by_id(conn, patient_id)
        .await?
        .filter(|user| user.role == Role::Patient)
        .ok_or_else(not_found)?;

    let visible = match ctx.role {
        Role::Admin => true,
        Role::Dentist => patient.dentist_id.is_none_or(|owner| owner == ctx.user_id),
        Role::Patient => patient.id == ctx.user_id,
    };

    if visible { Ok(patient) } else { Err(not_found()) }
}

/// Creates the admin, dentist and patient test accounts on an empty database.
///
/// Returns whether anything was created.
pub async fn seed_default_accounts(conn: &mut DbConn, seed: &SeedConfig) -> Result<bool> {
    if !seed.enabled {
        return Ok(false);
    }

    if users::count_users(conn).await? > 0 {
        tracing::debug!("users table not empty, skipping seed accounts");
        return Ok(false);
    }

    let admin = NewUser {
        name: "Administrador".to_string(),
        email: normalize_email(&seed.admin_email),
        password_hash: hash_password(seed.admin_password.expose_secret())?,
        role: Role::Admin,
        age: None,
        phone: None,
        photo: None,
        dentist_id: None,
    };
    users::create_user(conn, admin).await?;

    let dentist = NewUser {
        name: "Dentista Teste".to_string(),
        email: normalize_email(&seed.dentist_email),
        password_hash: hash_password(seed.dentist_password.expose_secret())?,
        role: Role::Dentist,
        age: None,
        phone: None,
        photo: None,
        dentist_id: None,
    };
    let dentist = users::create_user(conn, dentist).await?;

    let patient = NewUser {
        name: "Paciente Teste".to_string(),
        email: normalize_email(&seed.patient_email),
        password_hash: hash_password(seed.patient_password.expose_secret())?,
        role: Role::Patient,
        age: None,
        phone: None,
        photo: None,
        dentist_id: Some(dentist.id),
    };
    users::create_user(conn, patient).await?;

    tracing::info!("seeded default admin, dentist and patient accounts");
    Ok(true)
}
