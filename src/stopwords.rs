use std::{collections::HashSet, sync::LazyLock};

/// Portuguese stopwords, in the order of the NLTK corpus list.
///
/// The list is also returned by the `/meta` endpoints so clients can
/// reproduce the bag-of-words derivation.
pub const PORTUGUESE: &[&str] = &[
    "de", "a", "o", "que", "e", "é", "do", "da", "em", "um", "para", "com",
    "não", "uma", "os", "no", "se", "na", "por", "mais", "as", "dos", "como", "mas",
    "foi", "ao", "ele", "das", "tem", "à", "seu", "sua", "ou", "ser",
    "quando", "muito", "há", "nos", "já", "está", "eu", "também", "só",
    "pelo", "pela", "até", "isso", "ela", "entre", "era", "depois", "sem",
    "mesmo", "aos", "ter", "seus", "quem", "nas", "me", "esse", "eles",
    "estão", "você", "tinha", "foram", "essa", "num", "nem", "suas", "meu",
    "às", "minha", "têm", "numa", "pelos", "elas", "havia", "seja", "qual",
    "será", "nós", "tenho", "lhe", "deles", "essas", "esses", "pelas",
    "este", "fosse", "dele", "tu", "te", "vocês", "vos", "lhes", "meus",
    "minhas", "teu", "tua", "teus", "tuas", "nosso", "nossa", "nossos",
    "nossas", "dela", "delas", "esta", "estes", "estas", "aquele",
    "aquela", "aqueles", "aquelas", "isto", "aquilo", "estou", "estamos",
    "estive", "esteve", "estivemos", "estiveram", "estava", "estávamos",
    "estavam", "estivera", "estivéramos", "esteja", "estejamos", "estejam",
    "estivesse", "estivéssemos", "estivessem", "estiver", "estivermos",
    "estiverem", "hei", "havemos", "hão", "houve", "houvemos", "houveram",
    "houvera", "houvéramos", "haja", "hajamos", "hajam", "houvesse",
    "houvéssemos", "houvessem", "houver", "houvermos", "houverem",
    "houverei", "houverá", "houveremos", "houverão", "houveria",
    "houveríamos", "houveriam", "sou", "somos", "são", "éramos", "eram",
    "fui", "fomos", "fora", "fôramos", "sejamos", "sejam", "fôssemos",
    "fossem", "for", "formos", "forem", "serei", "seremos", "serão",
    "seria", "seríamos", "seriam", "temos", "tínhamos", "tinham", "tive",
    "teve", "tivemos", "tiveram", "tivera", "tivéramos", "tenha",
    "tenhamos", "tenham", "tivesse", "tivéssemos", "tivessem", "tiver",
    "tivermos", "tiverem", "terei", "terá", "teremos", "terão", "teria",
    "teríamos", "teriam",
];

static PORTUGUESE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PORTUGUESE.iter().copied().collect());

/// Whether `word` (already lowercased) is a Portuguese stopword.
pub fn is_stopword(word: &str) -> bool {
    PORTUGUESE_SET.contains(word)
}
