use crate::error::Result;
use crate::models::Category;

pub fn run() -> Result<()> {
    for category in Category::ALL {
        println!("{category}");
    }
    Ok(())
}
