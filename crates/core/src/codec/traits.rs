use crate::attribute::AttributeMap;
use crate::error::Result;

/// Converts a record to and from the attribute map the store persists.
///
/// Most records implement this by delegating to a
/// [`StructuralCodec`](super::StructuralCodec), using
/// [`marshal_keyed`](super::marshal_keyed) so that key-only records marshal to
/// their primary key.
pub trait ItemCodec: Sized {
    fn marshal_item(&self) -> Result<AttributeMap>;

    fn unmarshal_item(item: AttributeMap) -> Result<Self>;
}

/// An item handled as a bare attribute map, with no record type behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem(pub AttributeMap);

impl RawItem {
    pub fn into_inner(self) -> AttributeMap {
        self.0
    }
}

impl From<AttributeMap> for RawItem {
    fn from(item: AttributeMap) -> Self {
        RawItem(item)
    }
}

impl ItemCodec for RawItem {
    fn marshal_item(&self) -> Result<AttributeMap> {
        Ok(self.0.clone())
    }

    fn unmarshal_item(item: AttributeMap) -> Result<Self> {
        Ok(RawItem(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;

    #[test]
    fn test_raw_item_is_verbatim() {
        let mut item = AttributeMap::new();
        item.insert("id".to_string(), AttributeValue::string("a"));
        item.insert("tags".to_string(), AttributeValue::string_set(["x"]).unwrap());

        let raw = RawItem::unmarshal_item(item.clone()).unwrap();

        assert_eq!(raw.marshal_item().unwrap(), item);
        assert_eq!(raw.into_inner(), item);
    }
}
