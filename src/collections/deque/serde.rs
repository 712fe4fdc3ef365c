use core::{fmt, marker::PhantomData};

use ::serde::{
    de::{SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::BucketDeque;

const MAX_PREALLOC: usize = 1 << 16;

impl<T: Serialize> Serialize for BucketDeque<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for BucketDeque<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqVisitor<T> {
            marker: PhantomData<T>,
        }

        impl<'de, T> Visitor<'de> for SeqVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = BucketDeque<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence")
            }

            #[inline]
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                // Untrusted hint: cap the preallocated bucket array.
                let hint = seq.size_hint().unwrap_or(0).min(MAX_PREALLOC);
                let mut values = BucketDeque::sized_for(hint);
                while let Some(value) = seq.next_element()? {
                    values.push_back(value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_seq(SeqVisitor {
            marker: PhantomData,
        })
    }

    fn deserialize_in_place<D>(deserializer: D, place: &mut Self) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqInPlaceVisitor<'a, T>(&'a mut BucketDeque<T>);

        impl<'de, T> Visitor<'de> for SeqInPlaceVisitor<'_, T>
        where
            T: Deserialize<'de>,
        {
            type Value = ();

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence")
            }

            #[inline]
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                // Existing buckets are reused for the new contents.
                self.0.clear();
                while let Some(value) = seq.next_element()? {
                    self.0.push_back(value);
                }
                Ok(())
            }
        }

        deserializer.deserialize_seq(SeqInPlaceVisitor(place))
    }
}
