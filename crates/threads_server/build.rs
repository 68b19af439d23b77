use dotenv::dotenv;
use std::env;

fn main() {
    dotenv().ok();

    // defaults baked into the binary, overridable at runtime
    let mongodb_uri = env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string());
    println!("cargo:rustc-env=MONGODB_URI={}", mongodb_uri);
    let database_name = env::var("DATABASE_NAME").unwrap_or("threads".to_string());
    println!("cargo:rustc-env=DATABASE_NAME={}", database_name);
    println!("cargo:rerun-if-env-changed=MONGODB_URI");
    println!("cargo:rerun-if-env-changed=DATABASE_NAME");
}
